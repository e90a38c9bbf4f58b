//! Error taxonomy for build root management and package builds.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::image::ImageAction;

#[derive(Debug, Error)]
pub enum BuilderError {
    /// Creating or writing persistent build root state failed.
    #[error("build root I/O failed at '{}': {source}", path.display())]
    Infrastructure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required option is missing or a value is unusable.
    #[error("invalid builder configuration: {0}")]
    Configuration(String),

    #[error("base image {action} failed with exit code {code}")]
    BaseImage { action: ImageAction, code: i32 },

    #[error("failed to build package '{}' (exit code {code})", source_package.display())]
    BuildFailed { source_package: PathBuf, code: i32 },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "build of '{}' succeeded but no changes file was found in '{}'",
        source_package.display(),
        result_dir.display()
    )]
    ChangesNotFound {
        source_package: PathBuf,
        result_dir: PathBuf,
    },

    #[error("build root is locked by {holder}\n  lock file: {}", lock_path.display())]
    Locked { lock_path: PathBuf, holder: String },

    #[error("invalid profile '{}': {message}", path.display())]
    Profile { path: PathBuf, message: String },
}

impl BuilderError {
    pub(crate) fn infra(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Infrastructure {
            path: path.into(),
            source,
        }
    }

    /// Exit status carried by subprocess failures.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::BaseImage { code, .. } | Self::BuildFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuilderError>;
