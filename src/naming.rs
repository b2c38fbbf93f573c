//! Output naming and placement per platform
//!
//! Placement is a pure decision: the namer never touches the file system or the
//! manifest. For image-set placements it hands back the manifest entry the
//! caller should register.

use crate::config::SizeVariant;
use crate::contents_json::ImageEntry;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A source file, identified relative to the folder it was discovered in
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceImage {
    /// Containing directory relative to the source root (empty at the root)
    pub rel_dir: PathBuf,
    /// File name without extension
    pub base: String,
    /// Extension including the leading dot, or empty
    pub ext: String,
}

impl SourceImage {
    /// Build from a path relative to the source root.
    ///
    /// Returns `None` for paths without a file name.
    pub fn from_relative(rel: &Path) -> Option<Self> {
        let base = rel.file_stem()?.to_string_lossy().into_owned();
        let ext = rel
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let rel_dir = rel.parent().map(Path::to_path_buf).unwrap_or_default();
        Some(Self { rel_dir, base, ext })
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.base, self.ext)
    }

    pub fn relative_path(&self) -> PathBuf {
        self.rel_dir.join(self.file_name())
    }
}

/// Output location relative to the platform output root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placement {
    pub dir: PathBuf,
    pub file_name: String,
}

impl Placement {
    pub fn relative_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Placement decision plus the manifest entry it contributes, if any
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedAsset {
    pub placement: Placement,
    pub entry: Option<ImageEntry>,
}

/// Per-platform naming convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `<flavor>/<variant.path>/<file name>`, flavor taken from the source folder
    Flavor { default_flavor: String },
    /// `<rel dir>/<base><suffix>/<base><variant suffix><ext>`, registered in a manifest
    ImageSet { suffix: String },
}

impl NamingPolicy {
    pub fn place(&self, source: &SourceImage, variant: &SizeVariant) -> PlacedAsset {
        match self {
            NamingPolicy::Flavor { default_flavor } => {
                let flavor = flavor_of(source, default_flavor);
                let mut dir = PathBuf::from(flavor.into_owned());
                if let Some(path) = &variant.path {
                    dir.push(path);
                }
                PlacedAsset {
                    placement: Placement {
                        dir,
                        file_name: source.file_name(),
                    },
                    entry: None,
                }
            }
            NamingPolicy::ImageSet { suffix } => {
                let dir = source.rel_dir.join(format!("{}{}", source.base, suffix));
                let file_name = format!("{}{}{}", source.base, variant.suffix, source.ext);
                let entry = ImageEntry::universal(file_name.clone(), variant.scale.clone());
                PlacedAsset {
                    placement: Placement { dir, file_name },
                    entry: Some(entry),
                }
            }
        }
    }
}

/// Last folder of the source's directory, or the default at the source root
fn flavor_of<'a>(source: &'a SourceImage, default_flavor: &'a str) -> Cow<'a, str> {
    source
        .rel_dir
        .file_name()
        .map_or(Cow::Borrowed(default_flavor), |name| name.to_string_lossy())
}
