//! chroot-builder CLI
//!
//! ```bash
//! # Prepare the build root for a distribution profile
//! chroot-builder init profiles/lucid.toml
//!
//! # Create or refresh the base image
//! chroot-builder image profiles/lucid.toml --log image.log
//!
//! # Build a source package
//! chroot-builder build profiles/lucid.toml /tmp/src/nginx_0.7.65-1ubuntu2.dsc /tmp/out
//!
//! # Show layout, base image and lock state
//! chroot-builder status profiles/lucid.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chroot_builder::preflight::check_host_tools;
use chroot_builder::root::{LockHolder, RootState};
use chroot_builder::{LogSink, Pbuilder, Profile};

#[derive(Parser)]
#[command(name = "chroot-builder")]
#[command(author, version, about = "Build Debian source packages in pbuilder chroots", long_about = None)]
struct Cli {
    /// Builder-kind root holding one directory per distribution
    #[arg(long, env = "CHROOT_BUILDER_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Append pbuilder output to this file instead of discarding it
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the build root layout and configuration
    Init {
        /// Distribution profile (TOML)
        profile: PathBuf,
    },

    /// Create the base image if missing, update it otherwise
    Image {
        profile: PathBuf,
    },

    /// Build a source package
    Build {
        profile: PathBuf,
        /// Source package descriptor (.dsc)
        dsc: PathBuf,
        /// Directory receiving the build results
        result_dir: PathBuf,
    },

    /// Show build root state
    Status {
        profile: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => default_root()?,
    };
    let log = open_log(cli.log.as_deref())?;

    match cli.command {
        Commands::Init { profile } => cmd_init(&open(&profile, &root)?),
        Commands::Image { profile } => cmd_image(&open(&profile, &root)?, &log),
        Commands::Build {
            profile,
            dsc,
            result_dir,
        } => cmd_build(&open(&profile, &root)?, &dsc, &result_dir, &log),
        Commands::Status { profile } => cmd_status(&open(&profile, &root)?),
    }
}

fn default_root() -> Result<PathBuf> {
    let data = dirs::data_local_dir()
        .context("no local data directory; pass --root or set CHROOT_BUILDER_ROOT")?;
    Ok(data.join("chroot-builder").join("pbuilder"))
}

fn open_log(path: Option<&Path>) -> Result<LogSink> {
    match path {
        Some(path) => LogSink::append(path)
            .with_context(|| format!("opening log file '{}'", path.display())),
        None => Ok(LogSink::Null),
    }
}

fn open(profile_path: &Path, root: &Path) -> Result<Pbuilder> {
    let profile = Profile::load(profile_path)?;
    let builder = Pbuilder::new(profile.distribution, root, profile.builder)
        .with_context(|| format!("loading profile '{}'", profile_path.display()))?;
    Ok(builder)
}

fn cmd_init(builder: &Pbuilder) -> Result<()> {
    let _lock = builder.lock("init")?;
    builder.init()?;
    println!("Initialized {}", builder.root().path().display());
    Ok(())
}

fn cmd_image(builder: &Pbuilder, log: &LogSink) -> Result<()> {
    check_host_tools()?;
    let _lock = builder.lock("image")?;
    builder.init()?;

    let step = builder.ensure_base_image(log)?;
    if !step.succeeded() {
        bail!(
            "base image {} for '{}' exited with code {}",
            step.action,
            builder.distribution().name(),
            step.exit_code
        );
    }
    println!(
        "Base image {}d: {}",
        step.action,
        builder.root().base_image_path().display()
    );
    Ok(())
}

fn cmd_build(builder: &Pbuilder, dsc: &Path, result_dir: &Path, log: &LogSink) -> Result<()> {
    check_host_tools()?;
    let outcome = builder
        .build(dsc, result_dir, log)
        .with_context(|| format!("building '{}'", dsc.display()))?;
    println!("{}", outcome.changes_file.display());
    Ok(())
}

fn cmd_status(builder: &Pbuilder) -> Result<()> {
    let root = builder.root();
    println!("=== {} ===", builder.distribution().name());
    println!("  Root:        {}", root.path().display());
    println!("  Config:      {}", root.config_path().display());

    let image = if root.has_base_image() {
        "present"
    } else {
        "missing"
    };
    println!("  Base image:  {} ({})", root.base_image_path().display(), image);

    match LockHolder::current(&root.lock_path()) {
        Some(holder) => println!("  Lock:        held by {}", holder.describe()),
        None => println!("  Lock:        free"),
    }

    match RootState::load(&root.state_path())? {
        Some(state) => println!(
            "  Last image:  {} exited {} at {}",
            state.last_image_action, state.last_image_exit_code, state.updated_at_utc
        ),
        None => println!("  Last image:  never run"),
    }
    Ok(())
}
