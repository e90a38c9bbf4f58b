//! Preflight checks for build validation.
//!
//! Confirms the host has the programs every build shells out to, so a
//! missing pbuilder shows up as a clear message instead of a spawn error
//! halfway through a build.
//!
//! # Example
//!
//! ```rust
//! use chroot_builder::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("pbuilder") {
//!     println!("pbuilder not installed");
//! }
//!
//! let tools = &[("sudo", "sudo"), ("pbuilder", "pbuilder")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

use crate::tool::{ELEVATE_PROGRAM, TOOL_PROGRAM};

/// Check if a command exists in PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Host tools needed to create images and build packages.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    (ELEVATE_PROGRAM, "sudo"),
    (TOOL_PROGRAM, "pbuilder"),
];

/// Check that specific tools are available.
///
/// Returns an error listing every missing tool and the package providing it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check all tools in [`REQUIRED_TOOLS`].
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}
