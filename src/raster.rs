use crate::config::SizeVariant;
use crate::error::{AssetError, Result};
use crate::naming::{NamingPolicy, PlacedAsset, SourceImage};
use futures::future::try_join_all;
use image::{imageops::FilterType, DynamicImage};
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One raster conversion: every source image under `source_root` times every size
#[derive(Debug, Clone, Copy)]
pub struct RasterJob<'a> {
    pub source_root: &'a Path,
    pub dest_root: &'a Path,
    pub sizes: &'a [SizeVariant],
    pub policy: &'a NamingPolicy,
}

/// Find every file below `root` whose name has an extension.
///
/// Hidden files and folders are skipped. A missing root yields no sources.
pub fn discover_sources(root: &Path) -> Result<Vec<SourceImage>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            AssetError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() || entry.path().extension().is_none() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if let Some(source) = SourceImage::from_relative(rel) {
            sources.push(source);
        }
    }

    sources.sort();
    Ok(sources)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Scale both dimensions by `percentage`, never below one pixel
pub fn resize_percentage(image: &DynamicImage, percentage: f64) -> DynamicImage {
    let scale = |dim: u32| ((dim as f64 * percentage / 100.0).round() as u32).max(1);
    let (width, height) = (scale(image.width()), scale(image.height()));
    image.resize_exact(width, height, FilterType::Lanczos3)
}

fn resize_file(input: &Path, output: &Path, percentage: f64) -> Result<()> {
    let source = image::open(input).map_err(|e| AssetError::Image {
        path: input.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
    }

    resize_percentage(&source, percentage)
        .save(output)
        .map_err(|e| AssetError::Image {
            path: output.to_path_buf(),
            source: e,
        })
}

/// Resize every (size × image) pair and write it where the naming policy says.
///
/// Pairs are processed concurrently on blocking workers. The first failure is
/// returned; files already written stay on disk.
pub async fn convert_raster_images(job: RasterJob<'_>) -> Result<Vec<PlacedAsset>> {
    let sources = discover_sources(job.source_root)?;
    if sources.is_empty() {
        info!("No raster sources in {}", job.source_root.display());
        return Ok(Vec::new());
    }

    info!(
        "Resizing {} image(s) to {} size(s) into {}",
        sources.len(),
        job.sizes.len(),
        job.dest_root.display()
    );

    let tasks = job.sizes.iter().flat_map(|size| {
        sources.iter().map(move |source| {
            let placed = job.policy.place(source, size);
            let input: PathBuf = job.source_root.join(source.relative_path());
            let output: PathBuf = job.dest_root.join(placed.placement.relative_path());
            let percentage = size.percentage;
            async move {
                let written = output.clone();
                tokio::task::spawn_blocking(move || resize_file(&input, &output, percentage))
                    .await??;
                debug!("  ✓ Generated {}", written.display());
                Ok::<_, AssetError>(placed)
            }
        })
    });

    try_join_all(tasks).await
}
