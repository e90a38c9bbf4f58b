//! Build executor: prepares the root, keeps the base image current and runs
//! `pbuilder --build` for one source package.
//!
//! Every step shells out through `sudo`. The host must allow the calling
//! user to run pbuilder as root without a password prompt; nothing here
//! tries to work around that.

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::changes::find_changes_file;
use crate::distribution::Distribution;
use crate::error::{BuilderError, Result};
use crate::image::{self, ImageAction, ImageStep};
use crate::options::BuilderOptions;
use crate::root::{absolutize, BuildRoot, RootLock};
use crate::tool::{Invocation, LogSink, Overrides, PbuilderRunner, ToolRunner};

/// Successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// The `.changes` manifest naming the produced files.
    pub changes_file: PathBuf,
    /// The base image step that ran before the build.
    pub base_image: ImageStep,
}

/// pbuilder-backed builder for one distribution.
#[derive(Debug)]
pub struct Pbuilder<R = PbuilderRunner> {
    distribution: Distribution,
    root: BuildRoot,
    options: BuilderOptions,
    runner: R,
}

impl Pbuilder<PbuilderRunner> {
    /// Builder rooted at `<builder_root>/<distribution name>`.
    ///
    /// Options are validated here, so a missing keyring is reported before
    /// anything runs.
    pub fn new(
        distribution: Distribution,
        builder_root: &Path,
        options: BuilderOptions,
    ) -> Result<Self> {
        Self::with_runner(distribution, builder_root, options, PbuilderRunner)
    }
}

impl<R: ToolRunner> Pbuilder<R> {
    pub fn with_runner(
        distribution: Distribution,
        builder_root: &Path,
        options: BuilderOptions,
        runner: R,
    ) -> Result<Self> {
        distribution.validate()?;
        options.validate()?;
        let root = BuildRoot::new(builder_root, &distribution)?;
        Ok(Self {
            distribution,
            root,
            options,
            runner,
        })
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn root(&self) -> &BuildRoot {
        &self.root
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Takes the root's advisory lock. `command` is recorded for other
    /// processes that find the root busy.
    pub fn lock(&self, command: &str) -> Result<RootLock> {
        RootLock::acquire(&self.root.lock_path(), command)
    }

    pub fn init(&self) -> Result<()> {
        debug!(distribution = self.distribution.name(), "initializing pbuilder root");
        self.root.initialize(&self.distribution)
    }

    /// Bootstraps a new base image unconditionally.
    pub fn create(&self, log: &LogSink) -> Result<i32> {
        let step = image::run(&self.runner, ImageAction::Create, &self.root, &self.options, log)?;
        Ok(step.exit_code)
    }

    /// Refreshes the existing base image.
    pub fn update(&self, log: &LogSink) -> Result<i32> {
        let step = image::run(&self.runner, ImageAction::Update, &self.root, &self.options, log)?;
        Ok(step.exit_code)
    }

    /// Creates or updates the base image depending on whether it exists.
    pub fn ensure_base_image(&self, log: &LogSink) -> Result<ImageStep> {
        image::ensure_base_image(&self.runner, &self.root, &self.options, log)
    }

    /// Builds `source_package` (a `.dsc`) into `result_dir`.
    ///
    /// Holds the root lock throughout. Runs, in order: [`Self::init`], the
    /// base image step, then `pbuilder --build`. A failed base image step
    /// aborts the build unless `fail_on_base_image_error` is off.
    pub fn build(
        &self,
        source_package: &Path,
        result_dir: &Path,
        log: &LogSink,
    ) -> Result<BuildOutcome> {
        debug!(
            source_package = %source_package.display(),
            result_dir = %result_dir.display(),
            "building package"
        );

        let _lock = self.lock(&format!("build {}", source_package.display()))?;

        self.init()?;

        let base_image = self.ensure_base_image(log)?;
        if self.options.fail_on_base_image_error {
            base_image.check()?;
        } else if !base_image.succeeded() {
            warn!(
                action = %base_image.action,
                code = base_image.exit_code,
                "base image step failed, building anyway"
            );
        }

        let source_package = absolutize(source_package)?;
        let result_dir = absolutize(result_dir)?;
        let invocation = Invocation::build(
            &self.root.config_path(),
            &result_dir,
            self.options.jobs_or_default(),
            Overrides::from_options(&self.options),
            &source_package,
        );

        let code = self.runner.run(&invocation, log)?;
        if code != 0 {
            error!(
                source_package = %source_package.display(),
                code,
                "error building package"
            );
            if let Err(e) = log.write_line(&format!(
                "error building package {}: exit code {code}",
                source_package.display()
            )) {
                warn!(error = %e, "failed to write build failure to log");
            }
            return Err(BuilderError::BuildFailed {
                source_package,
                code,
            });
        }

        let changes_file =
            find_changes_file(&source_package, &result_dir, self.options.arch.as_deref())?;
        Ok(BuildOutcome {
            changes_file,
            base_image,
        })
    }
}
