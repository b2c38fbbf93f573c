use anyhow::Result;
use clap::{Parser, Subcommand};
use log::error;
use mobile_icons::{AssetError, Config, Pipeline, Platform, Task};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[clap(
    name = "mobile-icons",
    about = "Generate Android and iOS image assets from source images"
)]
struct Args {
    /// Directory holding paths.json, android.json and ios.json.
    #[clap(short, long, value_name = "DIR", default_value = "./config", global = true)]
    config: PathBuf,

    /// Only process this platform.
    #[clap(short, long, value_enum, global = true)]
    platform: Option<Platform>,

    /// Verbose logging and converter output.
    #[clap(long, global = true)]
    debug: bool,

    /// What to do. Without a command the output is cleaned and all images are generated.
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Remove generated output
    Clean,
    /// Resize raster sources
    Raster,
    /// Convert vector sources
    Vector,
    /// Raster and vector
    Images,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;
    let pipeline = Pipeline::new(config, args.debug);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match args.command {
            Some(Command::Clean) => pipeline.clean(args.platform).await,
            Some(Command::Raster) => pipeline.run(Task::Raster, args.platform).await,
            Some(Command::Vector) => pipeline.run(Task::Vector, args.platform).await,
            Some(Command::Images) => pipeline.run(Task::Images, args.platform).await,
            None => {
                pipeline.clean(args.platform).await?;
                pipeline.run(Task::Images, args.platform).await
            }
        }
    })
}

fn report(err: &anyhow::Error) {
    let external = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<AssetError>())
        .any(AssetError::is_external);

    if external {
        error!("External converter failed: {err:#}");
    } else {
        error!("{err:#}");
    }
}
