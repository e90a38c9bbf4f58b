//! Base image lifecycle: bootstrap a fresh image or refresh the existing one.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BuilderError, Result};
use crate::options::BuilderOptions;
use crate::root::{BuildRoot, RootState};
use crate::tool::{Invocation, LogSink, Overrides, ToolRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAction {
    Create,
    Update,
}

impl fmt::Display for ImageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageAction::Create => "create",
            ImageAction::Update => "update",
        })
    }
}

/// Result of one create/update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageStep {
    pub action: ImageAction,
    pub exit_code: i32,
}

impl ImageStep {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Converts a nonzero exit into [`BuilderError::BaseImage`].
    pub fn check(self) -> Result<Self> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(BuilderError::BaseImage {
                action: self.action,
                code: self.exit_code,
            })
        }
    }
}

/// Create when the base image file is missing, update otherwise.
pub fn choose_action(root: &BuildRoot) -> ImageAction {
    if root.has_base_image() {
        ImageAction::Update
    } else {
        ImageAction::Create
    }
}

pub fn invocation(
    action: ImageAction,
    root: &BuildRoot,
    options: &BuilderOptions,
) -> Result<Invocation> {
    let keyring = options.keyring.as_deref().ok_or_else(|| {
        BuilderError::Configuration("a keyring is required for bootstrap verification".into())
    })?;
    let overrides = Overrides::from_options(options);
    let config = root.config_path();
    Ok(match action {
        ImageAction::Create => Invocation::create(&config, keyring, overrides),
        ImageAction::Update => Invocation::update(&config, keyring, overrides),
    })
}

/// Runs `action` and records the outcome in the root's state file.
///
/// The exit code is returned as-is; a nonzero code is not an error here.
pub fn run<R: ToolRunner>(
    runner: &R,
    action: ImageAction,
    root: &BuildRoot,
    options: &BuilderOptions,
    log: &LogSink,
) -> Result<ImageStep> {
    debug!(root = %root.path().display(), %action, "running base image step");

    let invocation = invocation(action, root, options)?;
    let exit_code = runner.run(&invocation, log)?;

    if let Err(e) = RootState::record(root, action, exit_code) {
        warn!(error = %e, "failed to record base image state");
    }

    Ok(ImageStep { action, exit_code })
}

/// Picks create or update from the filesystem, then runs it.
pub fn ensure_base_image<R: ToolRunner>(
    runner: &R,
    root: &BuildRoot,
    options: &BuilderOptions,
    log: &LogSink,
) -> Result<ImageStep> {
    run(runner, choose_action(root), root, options, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use crate::tool::fake::FakeRunner;
    use crate::tool::Mode;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BuildRoot) {
        let temp = TempDir::new().unwrap();
        let dist = Distribution::new("lucid", "http://m/", "lucid", vec![], vec![]).unwrap();
        let root = BuildRoot::new(temp.path(), &dist).unwrap();
        root.initialize(&dist).unwrap();
        (temp, root)
    }

    #[test]
    fn creates_when_image_missing() {
        let (_temp, root) = setup();
        let runner = FakeRunner::new();

        let step =
            ensure_base_image(&runner, &root, &BuilderOptions::new("/k.gpg"), &LogSink::Null)
                .unwrap();

        assert_eq!(step.action, ImageAction::Create);
        assert_eq!(runner.modes(), [Mode::Create]);
    }

    #[test]
    fn updates_when_image_present() {
        let (_temp, root) = setup();
        fs::write(root.base_image_path(), b"tgz").unwrap();
        let runner = FakeRunner::new();

        let step =
            ensure_base_image(&runner, &root, &BuilderOptions::new("/k.gpg"), &LogSink::Null)
                .unwrap();

        assert_eq!(step.action, ImageAction::Update);
        assert_eq!(runner.modes(), [Mode::Update]);
        assert!(runner.calls()[0]
            .args
            .contains(&"--override-config".to_string()));
    }

    #[test]
    fn nonzero_exit_is_returned_not_raised() {
        let (_temp, root) = setup();
        let runner = FakeRunner::new().exit_code(Mode::Create, 1);

        let step =
            ensure_base_image(&runner, &root, &BuilderOptions::new("/k.gpg"), &LogSink::Null)
                .unwrap();

        assert_eq!(step.exit_code, 1);
        assert!(!step.succeeded());
        assert!(matches!(
            step.check(),
            Err(BuilderError::BaseImage {
                action: ImageAction::Create,
                code: 1
            })
        ));

        let state = RootState::load(&root.state_path()).unwrap().unwrap();
        assert_eq!(state.last_image_exit_code, 1);
    }

    #[test]
    fn missing_keyring_is_a_configuration_error() {
        let (_temp, root) = setup();
        let runner = FakeRunner::new();

        let err = ensure_base_image(&runner, &root, &BuilderOptions::default(), &LogSink::Null)
            .unwrap_err();

        assert!(matches!(err, BuilderError::Configuration(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn optional_overrides_are_appended() {
        let (_temp, root) = setup();
        let runner = FakeRunner::new();
        let options = BuilderOptions::new("/k.gpg")
            .debootstrap("cdebootstrap")
            .arch("i386");

        ensure_base_image(&runner, &root, &options, &LogSink::Null).unwrap();

        let args = &runner.calls()[0].args;
        assert!(args.windows(2).any(|w| w == ["--debootstrap", "cdebootstrap"]));
        assert!(args.windows(2).any(|w| w == ["--architecture", "i386"]));
        assert!(!args.iter().any(|a| a == "--mirror"));
    }
}
