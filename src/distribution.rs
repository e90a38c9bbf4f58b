//! Distribution profile: the target release packages are built for.

use serde::{Deserialize, Serialize};

use crate::error::{BuilderError, Result};

/// Immutable description of a target release.
///
/// `name` doubles as the directory key under the builder-kind root, so it is
/// validated to be a single safe path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Distribution {
    name: String,
    mirror: String,
    dist: String,
    components: Vec<String>,
    #[serde(default)]
    extra: Vec<String>,
}

impl Distribution {
    pub fn new(
        name: impl Into<String>,
        mirror: impl Into<String>,
        dist: impl Into<String>,
        components: Vec<String>,
        extra: Vec<String>,
    ) -> Result<Self> {
        let distribution = Self {
            name: name.into(),
            mirror: mirror.into(),
            dist: dist.into(),
            components,
            extra,
        };
        distribution.validate()?;
        Ok(distribution)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    /// Suite or codename, e.g. `lucid`.
    pub fn dist(&self) -> &str {
        &self.dist
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Additional repository source lines.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    /// Checks invariants that deserialization cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.mirror.trim().is_empty() {
            return Err(BuilderError::Configuration(format!(
                "distribution '{}' has an empty mirror",
                self.name
            )));
        }
        if self.dist.trim().is_empty() {
            return Err(BuilderError::Configuration(format!(
                "distribution '{}' has an empty dist",
                self.name
            )));
        }
        for (field, value) in [("mirror", &self.mirror), ("dist", &self.dist)] {
            if value.chars().any(is_line_break) {
                return Err(BuilderError::Configuration(format!(
                    "{field} for '{}' must be a single line: {value:?}",
                    self.name
                )));
            }
        }
        for component in &self.components {
            let blank = component.is_empty()
                || component.chars().any(|c| c.is_whitespace() || c.is_control());
            if blank {
                return Err(BuilderError::Configuration(format!(
                    "component for '{}' must be one non-blank word: {component:?}",
                    self.name
                )));
            }
        }
        for line in &self.extra {
            if line.contains('|') || line.chars().any(is_line_break) {
                return Err(BuilderError::Configuration(format!(
                    "extra repository line for '{}' must not contain '|' or newlines: {line:?}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// JSON sidecar rendering (`name`, `mirror`, `dist`, `components`, `extra`).
    pub fn to_sidecar_json(&self) -> String {
        serde_json::json!({
            "name": self.name,
            "mirror": self.mirror,
            "dist": self.dist,
            "components": self.components,
            "extra": self.extra,
        })
        .to_string()
    }
}

/// Characters that would end a `KEY=VALUE` line in `pbuilder.conf`.
fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\0')
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("must not contain path separators")
    } else if name.contains("..") {
        Some("must not contain '..'")
    } else if name.starts_with('.') {
        Some("must not start with '.'")
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("must not contain whitespace or control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(BuilderError::Configuration(format!(
            "distribution name {reason}: {name:?}"
        ))),
        None => Ok(()),
    }
}
