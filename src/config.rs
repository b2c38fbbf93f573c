//! Platform configuration
//!
//! Configuration lives in three JSON files inside one directory:
//! `paths.json` (working and source folders), `android.json` and `ios.json`
//! (per-platform size tables and naming metadata). The files are read once
//! into a [`Config`] value that is passed explicitly to every component.

use crate::error::{AssetError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Target platform of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Ios, Platform::Android];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source folders
#[derive(Debug, Clone, Deserialize)]
pub struct SourcePaths {
    pub raster: PathBuf,
    pub vector: PathBuf,
}

/// Contents of `paths.json`
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Working directory every platform writes into
    pub tmp: PathBuf,
    pub src: SourcePaths,
}

/// One resize target
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SizeVariant {
    /// Display density tagged in the manifest
    #[serde(default)]
    pub scale: Option<Number>,
    /// Resize factor in percent of the source dimensions
    pub percentage: f64,
    /// File name suffix (image-set platform)
    #[serde(default)]
    pub suffix: String,
    /// Density sub-folder (flavor platform)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SizeVariant {
    /// Unscaled entry used for vector-derived files.
    pub fn canonical() -> Self {
        Self {
            scale: None,
            percentage: 100.0,
            suffix: String::new(),
            path: None,
        }
    }
}

/// External converter command line
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConverterConfig {
    pub program: String,
    /// Arguments; `{input}` and `{output}` are replaced by the directories
    #[serde(default)]
    pub args: Vec<String>,
}

impl ConverterConfig {
    fn svg2vd() -> Self {
        Self {
            program: "mono".to_string(),
            args: ["svg2vd/svg2vd.exe", "-i", "{input}/*.svg", "-o", "{output}"]
                .map(String::from)
                .to_vec(),
        }
    }

    fn svg2pdf() -> Self {
        Self {
            program: "bash".to_string(),
            args: ["./svg2pdf.sh", "-i", "{input}", "-o", "{output}"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Contents of `android.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub root: PathBuf,
    pub vector_root: PathBuf,
    pub default_flavor: String,
    pub sizes: Vec<SizeVariant>,
    #[serde(default = "ConverterConfig::svg2vd")]
    pub converter: ConverterConfig,
}

/// Contents of `ios.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosConfig {
    pub root: PathBuf,
    pub sizes: Vec<SizeVariant>,
    /// Root manifest, written verbatim
    pub contents: Value,
    pub contents_file_name: String,
    pub image_set_suffix: String,
    #[serde(default = "ConverterConfig::svg2pdf")]
    pub converter: ConverterConfig,
}

impl IosConfig {
    /// Static `info` block shared by every image-set manifest
    pub fn info(&self) -> Value {
        self.contents.get("info").cloned().unwrap_or(Value::Null)
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    pub android: AndroidConfig,
    pub ios: IosConfig,
}

impl Config {
    /// Load `paths.json`, `android.json` and `ios.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            paths: load_json(&dir.join("paths.json"))?,
            android: load_json(&dir.join("android.json"))?,
            ios: load_json(&dir.join("ios.json"))?,
        })
    }

    /// `<tmp>/<platform>/<root>`
    pub fn dest_path(&self, platform: Platform) -> PathBuf {
        let root = match platform {
            Platform::Android => &self.android.root,
            Platform::Ios => &self.ios.root,
        };
        self.platform_dir(platform).join(root)
    }

    /// Scratch folder for converter output
    pub fn temp_vector_path(&self, platform: Platform) -> PathBuf {
        self.platform_dir(platform).join("vector")
    }

    /// Where the Android vector converter writes its drawables
    pub fn android_vector_dest(&self) -> PathBuf {
        self.platform_dir(Platform::Android)
            .join(&self.android.vector_root)
    }

    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.paths.tmp.join(platform.as_str())
    }

    pub fn converter(&self, platform: Platform) -> &ConverterConfig {
        match platform {
            Platform::Android => &self.android.converter,
            Platform::Ios => &self.ios.converter,
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| AssetError::Config {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    serde_json::from_str(&text).map_err(|e| AssetError::Config {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}
