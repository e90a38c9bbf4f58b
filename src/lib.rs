//! pbuilder-driven package builds.
//!
//! Given a [`Distribution`] and a `.dsc`, this crate prepares a per-distribution
//! build root, keeps its base image current, and runs pbuilder to produce the
//! package, reporting success, build failure and infrastructure errors as
//! distinct [`BuilderError`] variants.
//!
//! # Architecture
//!
//! ```text
//! Pbuilder::build(dsc, result_dir, log)
//!     │
//!     ├── root::BuildRoot::initialize    directories, distribution.json, pbuilder.conf
//!     ├── image::ensure_base_image       --create if base.tgz is missing, else --update
//!     ├── tool::Invocation::build        --build ... <dsc>
//!     └── changes::find_changes_file     <source>_<version>_<arch>.changes
//! ```
//!
//! All subprocesses go through a [`ToolRunner`]; [`PbuilderRunner`] runs
//! `sudo pbuilder` for real, and tests substitute a recording fake.
//!
//! # Example
//!
//! ```rust,no_run
//! use chroot_builder::{BuilderOptions, Distribution, LogSink, Pbuilder};
//! use std::path::Path;
//!
//! let lucid = Distribution::new(
//!     "lucid",
//!     "http://archive.ubuntu.com/ubuntu/",
//!     "lucid",
//!     vec!["main".into(), "universe".into()],
//!     vec![],
//! )?;
//! let options = BuilderOptions::new("/usr/share/keyrings/ubuntu-archive-keyring.gpg");
//! let builder = Pbuilder::new(lucid, Path::new("/var/lib/chroot-builder/pbuilder"), options)?;
//!
//! let log = LogSink::append(Path::new("/tmp/nginx.log"))?;
//! let outcome = builder.build(Path::new("/tmp/src/nginx_0.7.65-1ubuntu2.dsc"), Path::new("/tmp/out"), &log)?;
//! println!("{}", outcome.changes_file.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod changes;
pub mod distribution;
pub mod error;
pub mod image;
pub mod options;
pub mod preflight;
pub mod profile;
pub mod root;
pub mod tool;

pub use builder::{BuildOutcome, Pbuilder};
pub use distribution::Distribution;
pub use error::{BuilderError, Result};
pub use image::{ImageAction, ImageStep};
pub use options::BuilderOptions;
pub use profile::Profile;
pub use root::BuildRoot;
pub use tool::{LogSink, PbuilderRunner, ToolRunner};
