//! Per-platform asset runs and their aggregation
//!
//! Every platform is one named unit of work. A run builds the units for the
//! requested task, drops the ones excluded by the platform filter and waits
//! for all of the rest. Every selected unit runs to completion even when a
//! sibling fails, then the first failure fails the run. Partial output stays
//! on disk.

use crate::config::{Config, Platform};
use crate::contents_json::{write_json, ContentsMap};
use crate::error::AssetError;
use crate::naming::{NamingPolicy, PlacedAsset};
use crate::raster::{convert_raster_images, RasterJob};
use crate::vector::{integrate_vectors, ShellConverter, VectorConverter};
use anyhow::{Context, Result};
use futures::future::{join_all, FutureExt, LocalBoxFuture};
use log::info;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// What to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Raster,
    Vector,
    /// Raster and vector
    Images,
}

impl Task {
    fn includes_raster(self) -> bool {
        matches!(self, Task::Raster | Task::Images)
    }

    fn includes_vector(self) -> bool {
        matches!(self, Task::Vector | Task::Images)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Raster => write!(f, "raster"),
            Task::Vector => write!(f, "vector"),
            Task::Images => write!(f, "images"),
        }
    }
}

/// A named unit of work
pub type Unit<'a> = (Platform, LocalBoxFuture<'a, Result<()>>);

/// Run every unit not excluded by `filter` and wait for all of them.
///
/// Returns the first error, labelled with the platform that produced it.
pub async fn join_units(units: Vec<Unit<'_>>, filter: Option<Platform>) -> Result<()> {
    let selected = units
        .into_iter()
        .filter(|(platform, _)| filter.map_or(true, |only| only == *platform))
        .map(|(platform, unit)| async move {
            unit.await.with_context(|| format!("{platform} assets failed"))
        });
    settle(selected).await
}

/// Wait for every step, then report the first error in step order.
async fn settle<I>(steps: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: std::future::Future<Output = Result<()>>,
{
    join_all(steps).await.into_iter().collect()
}

/// Asset pipeline bound to one configuration
pub struct Pipeline {
    config: Config,
    converters: HashMap<Platform, Arc<dyn VectorConverter>>,
}

impl Pipeline {
    /// Use the configured shell converters; `verbose` shows their output.
    pub fn new(config: Config, verbose: bool) -> Self {
        let converters = Platform::ALL
            .into_iter()
            .map(|platform| {
                let converter = ShellConverter::new(config.converter(platform).clone(), verbose);
                (platform, Arc::new(converter) as Arc<dyn VectorConverter>)
            })
            .collect();
        Self { config, converters }
    }

    /// Replace the vector converter of one platform.
    pub fn with_converter(
        mut self,
        platform: Platform,
        converter: Arc<dyn VectorConverter>,
    ) -> Self {
        self.converters.insert(platform, converter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate `task` for both platforms, or only for `filter`.
    pub async fn run(&self, task: Task, filter: Option<Platform>) -> Result<()> {
        let units: Vec<Unit<'_>> = vec![
            (Platform::Ios, self.run_ios(task).boxed_local()),
            (Platform::Android, self.run_android(task).boxed_local()),
        ];
        join_units(units, filter).await?;
        info!("✓ Finished {task}");
        Ok(())
    }

    /// Remove the working directory, or only the filtered platform's part of it.
    pub async fn clean(&self, filter: Option<Platform>) -> Result<()> {
        let target = match filter {
            Some(platform) => self.config.platform_dir(platform),
            None => self.config.paths.tmp.clone(),
        };
        remove_dir(&target).await?;
        info!("✓ Cleaned {}", target.display());
        Ok(())
    }

    async fn run_android(&self, task: Task) -> Result<()> {
        let mut steps: Vec<LocalBoxFuture<'_, Result<()>>> = Vec::new();
        if task.includes_raster() {
            steps.push(self.android_raster().boxed_local());
        }
        if task.includes_vector() {
            steps.push(self.android_vector().boxed_local());
        }
        settle(steps).await
    }

    /// Raster and vector share image sets, so their manifest entries are
    /// merged and written once both branches are done. A failed branch
    /// contributes nothing; the other branch's manifests are still written.
    async fn run_ios(&self, task: Task) -> Result<()> {
        self.ios_root_contents().await?;

        let raster = async {
            if task.includes_raster() {
                self.ios_raster().await.map(Some)
            } else {
                Ok(None)
            }
        };
        let vector = async {
            if task.includes_vector() {
                self.ios_vector().await.map(Some)
            } else {
                Ok(None)
            }
        };
        let (raster, vector) = futures::join!(raster, vector);
        let vector_done = matches!(vector, Ok(Some(_)));

        let mut contents = ContentsMap::new(self.config.ios.info());
        let mut failure = None;
        for branch in [raster, vector] {
            match branch {
                Ok(Some(map)) => contents.merge(map)?,
                Ok(None) => {}
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        let sets = contents.len();
        contents
            .flush(&self.config.ios.contents_file_name)
            .await
            .context("writing image set contents")?;
        info!("✓ Wrote {sets} ios image set manifest(s)");

        if vector_done {
            remove_dir(&self.config.temp_vector_path(Platform::Ios)).await?;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn android_raster(&self) -> Result<()> {
        let dest = self.config.dest_path(Platform::Android);
        let policy = NamingPolicy::Flavor {
            default_flavor: self.config.android.default_flavor.clone(),
        };
        let placed = convert_raster_images(RasterJob {
            source_root: &self.config.paths.src.raster,
            dest_root: &dest,
            sizes: &self.config.android.sizes,
            policy: &policy,
        })
        .await
        .context("android raster conversion")?;

        info!("✓ Generated {} android raster image(s)", placed.len());
        Ok(())
    }

    async fn android_vector(&self) -> Result<()> {
        let dest = self.config.android_vector_dest();
        self.converter(Platform::Android)?
            .convert(&self.config.paths.src.vector, &dest)
            .await
            .context("android vector conversion")?;

        info!("✓ Generated android vector drawables in {}", dest.display());
        Ok(())
    }

    async fn ios_root_contents(&self) -> Result<()> {
        let dest = self
            .config
            .dest_path(Platform::Ios)
            .join(&self.config.ios.contents_file_name);
        write_json(&dest, &self.config.ios.contents)
            .await
            .context("writing root contents")?;

        info!("✓ Generated {}", dest.display());
        Ok(())
    }

    async fn ios_raster(&self) -> Result<ContentsMap> {
        let dest = self.config.dest_path(Platform::Ios);
        let policy = self.image_set_policy();
        let placed = convert_raster_images(RasterJob {
            source_root: &self.config.paths.src.raster,
            dest_root: &dest,
            sizes: &self.config.ios.sizes,
            policy: &policy,
        })
        .await
        .context("ios raster conversion")?;

        info!("✓ Generated {} ios raster image(s)", placed.len());
        self.collect_contents(&dest, placed)
    }

    /// Converts into the temp folder and places the results; the caller
    /// removes the temp folder once the manifests are written.
    async fn ios_vector(&self) -> Result<ContentsMap> {
        let dest = self.config.dest_path(Platform::Ios);
        let temp = self.config.temp_vector_path(Platform::Ios);

        self.converter(Platform::Ios)?
            .convert(&self.config.paths.src.vector, &temp)
            .await
            .context("ios vector conversion")?;

        let placed = integrate_vectors(&temp, &dest, &self.image_set_policy())
            .await
            .context("placing converted ios vectors")?;

        info!("✓ Generated {} ios vector image(s)", placed.len());
        self.collect_contents(&dest, placed)
    }

    /// Register the manifest entries of `placed`, keyed by image set folder.
    fn collect_contents(&self, dest_root: &Path, placed: Vec<PlacedAsset>) -> Result<ContentsMap> {
        let mut contents = ContentsMap::new(self.config.ios.info());
        for asset in placed {
            if let Some(entry) = asset.entry {
                contents.add_entry(dest_root.join(&asset.placement.dir), entry)?;
            }
        }
        Ok(contents)
    }

    fn image_set_policy(&self) -> NamingPolicy {
        NamingPolicy::ImageSet {
            suffix: self.config.ios.image_set_suffix.clone(),
        }
    }

    fn converter(&self, platform: Platform) -> Result<&Arc<dyn VectorConverter>> {
        self.converters
            .get(&platform)
            .with_context(|| format!("no vector converter for {platform}"))
    }
}

async fn remove_dir(path: &Path) -> Result<(), AssetError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AssetError::io(path, e)),
    }
}
