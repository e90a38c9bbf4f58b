//! Record of the last base image step taken on a build root.
//!
//! Purely informational: whether a base image exists is always decided by
//! looking at the filesystem, never by this record.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{BuilderError, Result};
use crate::image::ImageAction;

use super::{now_utc_compact, write_atomic, BuildRoot};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    pub version: u32,
    pub last_image_action: ImageAction,
    pub last_image_exit_code: i32,
    /// SHA-256 of the configuration file the step ran with.
    pub config_sha256: Option<String>,
    pub updated_at_utc: String,
}

impl RootState {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|e| BuilderError::infra(path, e))?;
        let state = serde_json::from_slice(&bytes)
            .map_err(|e| BuilderError::infra(path, std::io::Error::other(e)))?;
        Ok(Some(state))
    }

    /// Writes the record for a finished create/update step.
    pub fn record(root: &BuildRoot, action: ImageAction, exit_code: i32) -> Result<Self> {
        let state = Self {
            version: STATE_VERSION,
            last_image_action: action,
            last_image_exit_code: exit_code,
            config_sha256: sha256_file(&root.config_path()),
            updated_at_utc: now_utc_compact(),
        };
        let json = serde_json::to_vec_pretty(&state)
            .map_err(|e| BuilderError::infra(root.state_path(), std::io::Error::other(e)))?;
        write_atomic(&root.state_path(), &json)?;
        Ok(state)
    }
}

fn sha256_file(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    Some(format!("{:x}", Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use tempfile::TempDir;

    #[test]
    fn record_then_load() {
        let temp = TempDir::new().unwrap();
        let dist = Distribution::new("lucid", "http://m/", "lucid", vec![], vec![]).unwrap();
        let root = BuildRoot::new(temp.path(), &dist).unwrap();
        root.initialize(&dist).unwrap();

        assert_eq!(RootState::load(&root.state_path()).unwrap(), None);

        let written = RootState::record(&root, ImageAction::Create, 0).unwrap();
        let loaded = RootState::load(&root.state_path()).unwrap().unwrap();

        assert_eq!(written, loaded);
        assert_eq!(loaded.last_image_action, ImageAction::Create);
        assert_eq!(loaded.config_sha256.as_deref().map(str::len), Some(64));
    }
}
