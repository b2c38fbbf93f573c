//! Generate Android and iOS image assets from one folder of source images.
//!
//! Raster sources are resized to every configured density; vector sources are
//! handed to an external converter. For iOS every output lands in an image set
//! described by a `Contents.json` manifest.

pub mod config;
pub mod contents_json;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod raster;
pub mod vector;

pub use config::{Config, Platform, SizeVariant};
pub use error::AssetError;
pub use pipeline::{Pipeline, Task};
