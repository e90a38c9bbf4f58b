//! Per-distribution build root: directory skeleton, sidecar descriptor and
//! the rendered pbuilder configuration.
//!
//! Layout under `<builder-root>/<distribution>/`:
//!
//! ```text
//! base.tgz            base image (the root directory is the image cache)
//! aptcache/           package cache
//! result/             default build result directory
//! build/              chroot working area
//! hook/               pbuilder hooks
//! pbuilder.conf       rendered configuration (authoritative)
//! distribution.json   profile sidecar (informational)
//! state.json          last base image step (informational)
//! .lock               advisory lock
//! ```

pub mod config;
pub mod lock;
pub mod state;

use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing::debug;

use crate::distribution::Distribution;
use crate::error::{BuilderError, Result};

pub use config::PbuilderConfig;
pub use lock::{LockHolder, RootLock};
pub use state::RootState;

pub const CONFIG_FILENAME: &str = "pbuilder.conf";
pub const SIDECAR_FILENAME: &str = "distribution.json";
pub const BASE_IMAGE_FILENAME: &str = "base.tgz";
pub const STATE_FILENAME: &str = "state.json";
pub const LOCK_FILENAME: &str = ".lock";

const APTCACHE_DIR: &str = "aptcache";
const RESULT_DIR: &str = "result";
const BUILD_DIR: &str = "build";
const HOOK_DIR: &str = "hook";

/// On-disk state for one (builder-kind root, distribution) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRoot {
    path: PathBuf,
}

impl BuildRoot {
    /// Resolves `<builder_root>/<name>` to an absolute path. Nothing is created.
    pub fn new(builder_root: &Path, distribution: &Distribution) -> Result<Self> {
        let builder_root = absolutize(builder_root)?;
        Ok(Self {
            path: builder_root.join(distribution.name()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the base image.
    pub fn image_cache_dir(&self) -> &Path {
        &self.path
    }

    pub fn base_image_path(&self) -> PathBuf {
        self.image_cache_dir().join(BASE_IMAGE_FILENAME)
    }

    pub fn aptcache_dir(&self) -> PathBuf {
        self.path.join(APTCACHE_DIR)
    }

    pub fn result_dir(&self) -> PathBuf {
        self.path.join(RESULT_DIR)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.path.join(BUILD_DIR)
    }

    pub fn hook_dir(&self) -> PathBuf {
        self.path.join(HOOK_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILENAME)
    }

    pub fn sidecar_path(&self) -> PathBuf {
        self.path.join(SIDECAR_FILENAME)
    }

    pub fn state_path(&self) -> PathBuf {
        self.path.join(STATE_FILENAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path.join(LOCK_FILENAME)
    }

    /// Base image presence, read straight from the filesystem.
    ///
    /// Read-then-act: callers that act on the answer should hold the
    /// [`RootLock`] for the duration.
    pub fn has_base_image(&self) -> bool {
        self.base_image_path().is_file()
    }

    fn skeleton(&self) -> [PathBuf; 5] {
        [
            self.path.clone(),
            self.aptcache_dir(),
            self.result_dir(),
            self.build_dir(),
            self.hook_dir(),
        ]
    }

    /// Creates missing directories, then rewrites the sidecar and the
    /// configuration file. Safe to call before every build.
    pub fn initialize(&self, distribution: &Distribution) -> Result<()> {
        debug!(root = %self.path.display(), "initializing build root");

        for dir in self.skeleton() {
            fs::create_dir_all(&dir).map_err(|e| BuilderError::infra(&dir, e))?;
        }

        write_atomic(&self.sidecar_path(), distribution.to_sidecar_json().as_bytes())?;

        let config = PbuilderConfig::for_root(self, distribution);
        write_atomic(&self.config_path(), config.render().as_bytes())?;

        Ok(())
    }
}

/// Writes `contents` to a temporary sibling and renames it over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let tmp = path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));

    fs::write(&tmp, contents).map_err(|e| BuilderError::infra(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(BuilderError::infra(path, e));
    }
    Ok(())
}

pub(crate) fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| BuilderError::infra(path, e))?;
    Ok(cwd.join(path))
}

pub(crate) fn now_utc_compact() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
