//! Contents.json data model for asset catalog image sets
//!
//! This module defines the manifest written into every image-set folder and
//! the accumulator that collects entries for many image sets during one run
//! before they are written out together.

use crate::error::{AssetError, Result};
use futures::future::try_join_all;
use log::debug;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root structure of an image-set Contents.json file
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ContentsFile {
    /// One entry per file in the image set
    pub images: Vec<ImageEntry>,

    /// Static platform metadata, copied from the root manifest
    pub info: Value,
}

/// Individual image entry within an image set
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImageEntry {
    /// The device type for the image; always "universal" here
    pub idiom: String,

    /// The file name inside the image-set folder
    pub filename: String,

    /// Display density multiplier; absent for vector files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Number>,
}

impl ContentsFile {
    /// Creates a new Contents.json structure with the given info block
    ///
    /// # Arguments
    /// * `info` - The platform-supplied info object
    ///
    /// # Returns
    /// A new ContentsFile with an empty images array
    pub fn new(info: Value) -> Self {
        Self {
            images: Vec::new(),
            info,
        }
    }

    /// Adds an image entry to the contents file
    ///
    /// # Arguments
    /// * `image` - The ImageEntry to add
    pub fn add_image(&mut self, image: ImageEntry) {
        self.images.push(image);
    }

    /// Orders entries by scale (unscaled first), then by file name
    fn sort_images(&mut self) {
        self.images.sort_by(|a, b| {
            compare_scale(a.scale.as_ref(), b.scale.as_ref())
                .then_with(|| a.filename.cmp(&b.filename))
        });
    }
}

impl ImageEntry {
    /// Creates a universal image entry
    ///
    /// # Arguments
    /// * `filename` - The file name inside the image set
    /// * `scale` - The display density, or `None` for a vector file
    pub fn universal(filename: String, scale: Option<Number>) -> Self {
        Self {
            idiom: "universal".to_string(),
            filename,
            scale,
        }
    }
}

fn compare_scale(a: Option<&Number>, b: Option<&Number>) -> Ordering {
    let a = a.and_then(Number::as_f64);
    let b = b.and_then(Number::as_f64);
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Manifests collected during one raster or vector run, keyed by image-set folder
#[derive(Debug, Clone)]
pub struct ContentsMap {
    info: Value,
    groups: BTreeMap<PathBuf, ContentsFile>,
}

impl ContentsMap {
    pub fn new(info: Value) -> Self {
        Self {
            info,
            groups: BTreeMap::new(),
        }
    }

    /// Register one entry under `group_dir`, creating the group on first use.
    ///
    /// # Errors
    /// Returns [`AssetError::DuplicateEntry`] if the group already lists a file
    /// of the same name.
    pub fn add_entry(&mut self, group_dir: PathBuf, entry: ImageEntry) -> Result<()> {
        let info = &self.info;
        let group = self
            .groups
            .entry(group_dir.clone())
            .or_insert_with(|| ContentsFile::new(info.clone()));

        if group.images.iter().any(|e| e.filename == entry.filename) {
            return Err(AssetError::DuplicateEntry {
                group: group_dir,
                filename: entry.filename,
            });
        }

        group.add_image(entry);
        Ok(())
    }

    /// Move every entry of `other` into this map.
    ///
    /// Groups present in both maps end up listing the entries of both.
    ///
    /// # Errors
    /// Returns [`AssetError::DuplicateEntry`] if both maps list the same file
    /// in the same group.
    pub fn merge(&mut self, other: ContentsMap) -> Result<()> {
        for (dir, contents) in other.groups {
            for entry in contents.images {
                self.add_entry(dir.clone(), entry)?;
            }
        }
        Ok(())
    }

    pub fn group(&self, dir: &Path) -> Option<&ContentsFile> {
        self.groups.get(dir)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Write `<group>/<file_name>` for every group.
    ///
    /// All writes run concurrently; the first failure is returned.
    pub async fn flush(self, file_name: &str) -> Result<()> {
        let writes = self.groups.into_iter().map(|(dir, mut contents)| {
            contents.sort_images();
            let dest = dir.join(file_name);
            async move {
                write_json(&dest, &contents).await?;
                debug!("  ✓ Generated {}", dest.display());
                Ok::<_, AssetError>(())
            }
        });
        try_join_all(writes).await?;
        Ok(())
    }
}

/// Serialize `value` with a 4-space indent
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Writes a JSON file, creating missing parent directories first
///
/// # Arguments
/// * `dest` - The file to write
/// * `value` - Anything serializable
///
/// # Errors
/// Returns an error if:
/// - JSON serialization fails
/// - A parent directory cannot be created
/// - File writing fails
pub async fn write_json<T: Serialize>(dest: &Path, value: &T) -> Result<()> {
    let json = to_pretty_json(value)?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AssetError::io(parent, e))?;
    }
    tokio::fs::write(dest, json)
        .await
        .map_err(|e| AssetError::io(dest, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> Value {
        json!({ "version": 1, "author": "xcode" })
    }

    fn scaled(filename: &str, scale: u64) -> ImageEntry {
        ImageEntry::universal(filename.to_string(), Some(Number::from(scale)))
    }

    #[test]
    fn test_contents_file_creation() {
        let contents = ContentsFile::new(info());
        assert_eq!(contents.info["author"], "xcode");
        assert!(contents.images.is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let mut contents = ContentsFile::new(info());
        contents.add_image(ImageEntry::universal(
            "icon@2x.png".to_string(),
            Some(Number::from(2)),
        ));
        contents.add_image(ImageEntry::universal("icon.pdf".to_string(), None));

        let json = String::from_utf8(to_pretty_json(&contents).unwrap()).unwrap();

        let expected = r#"{
    "images": [
        {
            "idiom": "universal",
            "filename": "icon@2x.png",
            "scale": 2
        },
        {
            "idiom": "universal",
            "filename": "icon.pdf"
        }
    ],
    "info": {
        "author": "xcode",
        "version": 1
    }
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_add_entry_groups_by_folder() {
        let mut map = ContentsMap::new(info());
        let a = PathBuf::from("out/a.imageset");
        let b = PathBuf::from("out/b.imageset");

        map.add_entry(a.clone(), scaled("a.png", 1)).unwrap();
        map.add_entry(a.clone(), scaled("a@2x.png", 2)).unwrap();
        map.add_entry(b.clone(), scaled("b.png", 1)).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.group(&a).unwrap().images.len(), 2);
        assert_eq!(map.group(&b).unwrap().info, info());
    }

    #[test]
    fn test_duplicate_entry_is_rejected() {
        let mut map = ContentsMap::new(info());
        let dir = PathBuf::from("out/a.imageset");

        map.add_entry(dir.clone(), scaled("a.png", 1)).unwrap();
        let err = map
            .add_entry(dir.clone(), scaled("a.png", 2))
            .unwrap_err();

        match err {
            AssetError::DuplicateEntry { group, filename } => {
                assert_eq!(group, dir);
                assert_eq!(filename, "a.png");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_combines_shared_groups() {
        let shared = PathBuf::from("out/icon.imageset");
        let other_dir = PathBuf::from("out/logo.imageset");

        let mut raster = ContentsMap::new(info());
        raster.add_entry(shared.clone(), scaled("icon@1x.png", 1)).unwrap();
        raster.add_entry(shared.clone(), scaled("icon@2x.png", 2)).unwrap();

        let mut vector = ContentsMap::new(info());
        vector
            .add_entry(shared.clone(), ImageEntry::universal("icon.pdf".to_string(), None))
            .unwrap();
        vector
            .add_entry(other_dir.clone(), ImageEntry::universal("logo.pdf".to_string(), None))
            .unwrap();

        raster.merge(vector).unwrap();

        assert_eq!(raster.len(), 2);
        let names: Vec<&str> = raster
            .group(&shared)
            .unwrap()
            .images
            .iter()
            .map(|e| e.filename.as_str())
            .collect();
        assert_eq!(names, ["icon@1x.png", "icon@2x.png", "icon.pdf"]);
        assert_eq!(raster.group(&other_dir).unwrap().images.len(), 1);
    }

    #[test]
    fn test_merge_rejects_same_file_twice() {
        let dir = PathBuf::from("out/icon.imageset");
        let mut first = ContentsMap::new(info());
        first.add_entry(dir.clone(), scaled("icon.png", 1)).unwrap();
        let mut second = ContentsMap::new(info());
        second.add_entry(dir.clone(), scaled("icon.png", 1)).unwrap();

        let err = first.merge(second).unwrap_err();

        assert!(matches!(err, AssetError::DuplicateEntry { .. }));
    }

    #[test]
    fn test_sort_images_by_scale() {
        let mut contents = ContentsFile::new(info());
        contents.add_image(scaled("i@3x.png", 3));
        contents.add_image(scaled("i.png", 1));
        contents.add_image(ImageEntry::universal("i.pdf".to_string(), None));
        contents.add_image(scaled("i@2x.png", 2));

        contents.sort_images();

        let names: Vec<_> = contents.images.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, ["i.pdf", "i.png", "i@2x.png", "i@3x.png"]);
    }

    #[tokio::test]
    async fn test_flush_writes_one_manifest_per_group() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("nested/a.imageset");
        let b = temp.path().join("b.imageset");

        let mut map = ContentsMap::new(info());
        map.add_entry(a.clone(), scaled("a@2x.png", 2)).unwrap();
        map.add_entry(a.clone(), scaled("a.png", 1)).unwrap();
        map.add_entry(b.clone(), scaled("b.png", 1)).unwrap();

        map.flush("Contents.json").await.unwrap();

        let parsed: Value =
            serde_json::from_str(&std::fs::read_to_string(a.join("Contents.json")).unwrap())
                .unwrap();
        assert_eq!(parsed["images"][0]["filename"], "a.png");
        assert_eq!(parsed["images"][1]["scale"], 2);
        assert_eq!(parsed["info"]["version"], 1);
        assert!(b.join("Contents.json").exists());
    }

    #[tokio::test]
    async fn test_write_json_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("x/y/Contents.json");

        write_json(&dest, &info()).await.unwrap();

        let text = std::fs::read_to_string(&dest).unwrap();
        assert!(text.contains("\n    \"author\": \"xcode\""));
    }
}
