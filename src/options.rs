//! Builder options shared by the base image lifecycle and the build step.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{BuilderError, Result};

/// Parallelism hint passed to the inner package build when none is given.
pub const DEFAULT_JOBS: usize = 9;

/// Options for one builder instance.
///
/// `keyring` is mandatory and checked by [`BuilderOptions::validate`], which
/// [`crate::Pbuilder::new`] calls before anything touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderOptions {
    /// Keyring used by the bootstrap tool to verify the archive.
    pub keyring: Option<PathBuf>,
    /// Alternate bootstrap tool (e.g. `cdebootstrap`).
    pub debootstrap: Option<String>,
    /// Mirror override passed to the chroot tool.
    pub mirror: Option<String>,
    /// Target architecture (e.g. `amd64`).
    pub arch: Option<String>,
    /// Parallel jobs for the inner build.
    pub jobs: Option<usize>,
    /// Abort before building when base image create/update fails.
    #[serde(default = "default_true")]
    pub fail_on_base_image_error: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            keyring: None,
            debootstrap: None,
            mirror: None,
            arch: None,
            jobs: None,
            fail_on_base_image_error: true,
        }
    }
}

impl BuilderOptions {
    pub fn new(keyring: impl Into<PathBuf>) -> Self {
        Self {
            keyring: Some(keyring.into()),
            ..Default::default()
        }
    }

    pub fn debootstrap(mut self, tool: impl Into<String>) -> Self {
        self.debootstrap = Some(tool.into());
        self
    }

    pub fn mirror(mut self, mirror: impl Into<String>) -> Self {
        self.mirror = Some(mirror.into());
        self
    }

    pub fn arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn fail_on_base_image_error(mut self, fail: bool) -> Self {
        self.fail_on_base_image_error = fail;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.keyring {
            None => {
                return Err(BuilderError::Configuration(
                    "a keyring is required for bootstrap verification".into(),
                ))
            }
            Some(path) if path.as_os_str().is_empty() => {
                return Err(BuilderError::Configuration("keyring path is empty".into()))
            }
            Some(_) => {}
        }
        if self.jobs == Some(0) {
            return Err(BuilderError::Configuration(
                "jobs must be at least 1".into(),
            ));
        }
        for (field, value) in [
            ("debootstrap", &self.debootstrap),
            ("mirror", &self.mirror),
            ("arch", &self.arch),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(BuilderError::Configuration(format!(
                    "{field} override is set but empty"
                )));
            }
        }
        Ok(())
    }

    pub fn jobs_or_default(&self) -> usize {
        self.jobs.unwrap_or(DEFAULT_JOBS)
    }
}
