//! TOML profile files pairing a distribution with builder options.
//!
//! ```toml
//! [distribution]
//! name = "lucid"
//! mirror = "http://archive.ubuntu.com/ubuntu/"
//! dist = "lucid"
//! components = ["main", "universe"]
//! extra = []
//!
//! [builder]
//! keyring = "/usr/share/keyrings/ubuntu-archive-keyring.gpg"
//! arch = "amd64"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::distribution::Distribution;
use crate::error::{BuilderError, Result};
use crate::options::BuilderOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub distribution: Distribution,
    #[serde(default)]
    pub builder: BuilderOptions,
}

impl Profile {
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(contents).map_err(|e| BuilderError::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        profile.distribution.validate()?;
        profile.builder.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| BuilderError::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }
}
