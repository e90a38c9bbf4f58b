//! Adapter for the pbuilder command-line contract.
//!
//! An [`Invocation`] is an immutable description of one pbuilder call. It is
//! turned into an argument vector by [`Invocation::args`] and executed by a
//! [`ToolRunner`]; [`PbuilderRunner`] is the real one.

mod log;
mod runner;

#[cfg(test)]
pub(crate) mod fake;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::options::BuilderOptions;

pub use log::LogSink;
pub use runner::{exit_code, PbuilderRunner, ToolRunner, ELEVATE_PROGRAM, TOOL_PROGRAM};

/// pbuilder operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Create,
    Update,
    Build,
}

impl Mode {
    pub fn flag(self) -> &'static str {
        match self {
            Mode::Create => "--create",
            Mode::Update => "--update",
            Mode::Build => "--build",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Create => "create",
            Mode::Update => "update",
            Mode::Build => "build",
        })
    }
}

/// Optional flags shared by every mode. Unset values emit nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub debootstrap: Option<String>,
    pub mirror: Option<String>,
    pub arch: Option<String>,
}

impl Overrides {
    pub fn from_options(options: &BuilderOptions) -> Self {
        Self {
            debootstrap: options.debootstrap.clone(),
            mirror: options.mirror.clone(),
            arch: options.arch.clone(),
        }
    }

    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        for (flag, value) in [
            ("--debootstrap", &self.debootstrap),
            ("--mirror", &self.mirror),
            ("--architecture", &self.arch),
        ] {
            if let Some(value) = value {
                args.push(flag.into());
                args.push(value.into());
            }
        }
        args
    }
}

/// One fully-specified pbuilder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    mode: Mode,
    config_file: PathBuf,
    keyring: Option<PathBuf>,
    result_dir: Option<PathBuf>,
    build_opts: Option<String>,
    overrides: Overrides,
    source_package: Option<PathBuf>,
}

impl Invocation {
    pub fn create(config_file: &Path, keyring: &Path, overrides: Overrides) -> Self {
        Self::image(Mode::Create, config_file, keyring, overrides)
    }

    /// Update mode always passes `--override-config` so the on-disk
    /// configuration wins over whatever the base image recorded.
    pub fn update(config_file: &Path, keyring: &Path, overrides: Overrides) -> Self {
        Self::image(Mode::Update, config_file, keyring, overrides)
    }

    fn image(mode: Mode, config_file: &Path, keyring: &Path, overrides: Overrides) -> Self {
        Self {
            mode,
            config_file: config_file.to_path_buf(),
            keyring: Some(keyring.to_path_buf()),
            result_dir: None,
            build_opts: None,
            overrides,
            source_package: None,
        }
    }

    pub fn build(
        config_file: &Path,
        result_dir: &Path,
        jobs: usize,
        overrides: Overrides,
        source_package: &Path,
    ) -> Self {
        Self {
            mode: Mode::Build,
            config_file: config_file.to_path_buf(),
            keyring: None,
            result_dir: Some(result_dir.to_path_buf()),
            build_opts: Some(format!("-I -i -j{jobs}")),
            overrides,
            source_package: Some(source_package.to_path_buf()),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn result_dir(&self) -> Option<&Path> {
        self.result_dir.as_deref()
    }

    pub fn source_package(&self) -> Option<&Path> {
        self.source_package.as_deref()
    }

    /// Arguments passed to pbuilder (the program itself excluded).
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.mode.flag().into()];
        if self.mode == Mode::Update {
            args.push("--override-config".into());
        }
        args.push("--configfile".into());
        args.push(self.config_file.clone().into());

        if let Some(result_dir) = &self.result_dir {
            args.push("--buildresult".into());
            args.push(result_dir.clone().into());
        }
        if let Some(keyring) = &self.keyring {
            let mut opt = OsString::from("--keyring=");
            opt.push(keyring);
            args.push("--debootstrapopts".into());
            args.push(opt);
        }
        if let Some(build_opts) = &self.build_opts {
            args.push("--debbuildopts".into());
            args.push(build_opts.into());
        }

        args.extend(self.overrides.to_args());

        if let Some(source_package) = &self.source_package {
            args.push(source_package.clone().into());
        }
        args
    }
}
