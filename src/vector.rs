use crate::config::{ConverterConfig, SizeVariant};
use crate::error::{AssetError, Result};
use crate::naming::{NamingPolicy, PlacedAsset};
use crate::raster::discover_sources;
use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, info};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Converts a folder of vector sources into a folder of platform files
#[async_trait]
pub trait VectorConverter: Send + Sync {
    async fn convert(&self, input_dir: &Path, output_dir: &Path) -> Result<()>;
}

/// Runs an external program, e.g. `mono svg2vd.exe` or `bash svg2pdf.sh`
#[derive(Debug, Clone)]
pub struct ShellConverter {
    config: ConverterConfig,
    verbose: bool,
}

impl ShellConverter {
    pub fn new(config: ConverterConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// Arguments with `{input}` and `{output}` filled in
    pub fn args(&self, input_dir: &Path, output_dir: &Path) -> Vec<String> {
        let input = input_dir.to_string_lossy();
        let output = output_dir.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }

    fn stdio(&self) -> Stdio {
        if self.verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

#[async_trait]
impl VectorConverter for ShellConverter {
    async fn convert(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| AssetError::io(output_dir, e))?;

        let args = self.args(input_dir, output_dir);
        debug!("Running {} {}", self.config.program, args.join(" "));

        let status = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(self.stdio())
            .stderr(self.stdio())
            .status()
            .await
            .map_err(|source| AssetError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(AssetError::Converter {
                program: self.config.program.clone(),
                code: status.code(),
            });
        }
        Ok(())
    }
}

/// Move converter output from `temp_dir` into `dest_root` using `policy`.
///
/// Every file is placed with the canonical (unscaled) variant. Returns the
/// placements so the caller can register their manifest entries.
pub async fn integrate_vectors(
    temp_dir: &Path,
    dest_root: &Path,
    policy: &NamingPolicy,
) -> Result<Vec<PlacedAsset>> {
    let sources = discover_sources(temp_dir)?;
    info!(
        "Placing {} converted vector file(s) into {}",
        sources.len(),
        dest_root.display()
    );

    let canonical = SizeVariant::canonical();
    let copies = sources.iter().map(|source| {
        let placed = policy.place(source, &canonical);
        let from = temp_dir.join(source.relative_path());
        let dir = dest_root.join(&placed.placement.dir);
        let to = dest_root.join(placed.placement.relative_path());
        async move {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| AssetError::io(&dir, e))?;
            tokio::fs::copy(&from, &to)
                .await
                .map_err(|e| AssetError::io(&from, e))?;
            debug!("  ✓ Placed {}", to.display());
            Ok::<_, AssetError>(placed)
        }
    });

    try_join_all(copies).await
}
