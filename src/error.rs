use std::path::PathBuf;

/// Errors raised by the asset pipeline components.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Configuration file could not be read or parsed
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File system operation failed
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source image could not be decoded, resized or encoded
    #[error("image error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Manifest serialization failed
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// External converter could not be started
    #[error("failed to spawn converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External converter ran but exited unsuccessfully
    #[error("converter '{program}' exited with {}", exit_code_label(.code))]
    Converter { program: String, code: Option<i32> },

    /// Two assets were placed under the same name in one image set
    #[error("duplicate manifest entry '{filename}' in {group}")]
    DuplicateEntry { group: PathBuf, filename: String },

    /// A blocking worker panicked or was cancelled
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures of an external converter process.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Spawn { .. } | Self::Converter { .. })
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type Result<T, E = AssetError> = std::result::Result<T, E>;
