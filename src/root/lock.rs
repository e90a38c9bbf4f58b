//! Advisory lock serializing work on one build root.
//!
//! The lock file records who holds it so contention errors can name the
//! holder, and a holder whose pid is gone can be reported as stale.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::{BuilderError, Result};

use super::now_utc_compact;

/// Metadata written into a held lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub command: String,
    pub acquired_at_utc: String,
}

impl LockHolder {
    /// Whether the recorded pid still names a live process on this host.
    pub fn is_alive(&self) -> bool {
        let Ok(pid) = libc::pid_t::try_from(self.pid) else {
            return false;
        };
        // SAFETY: signal 0 performs only the existence and permission check.
        let rc = unsafe { libc::kill(pid, 0) };
        if rc == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    pub fn describe(&self) -> String {
        let stale = if self.is_alive() {
            ""
        } else {
            " [stale: process not running]"
        };
        format!(
            "'{}' (pid {}, since {}){}",
            self.command, self.pid, self.acquired_at_utc, stale
        )
    }

    /// Reads holder metadata from a lock file, if any was recorded.
    pub fn read(lock_path: &Path) -> Option<Self> {
        let mut contents = String::new();
        File::open(lock_path)
            .ok()?
            .read_to_string(&mut contents)
            .ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// The holder of a lock that is actually held right now.
    ///
    /// A holder killed without unwinding leaves its metadata behind but
    /// not the flock, so the recorded JSON alone is not proof of a holder.
    pub fn current(lock_path: &Path) -> Option<Self> {
        let file = File::open(lock_path).ok()?;
        if file.try_lock_shared().is_ok() {
            let _ = FileExt::unlock(&file);
            return None;
        }
        drop(file);
        Self::read(lock_path)
    }
}

/// Held exclusive lock; released when dropped.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    /// Takes the lock without blocking, failing with
    /// [`BuilderError::Locked`] when someone else holds it.
    pub fn acquire(lock_path: &Path, command: &str) -> Result<Self> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuilderError::infra(parent, e))?;
        }

        // Never unlink the file: a second process could then lock a fresh
        // inode at the same path while the first still holds the old one.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| BuilderError::infra(lock_path, e))?;

        if file.try_lock_exclusive().is_err() {
            drop(file);
            let holder = LockHolder::read(lock_path)
                .map(|h| h.describe())
                .unwrap_or_else(|| "an unknown process".to_string());
            return Err(BuilderError::Locked {
                lock_path: lock_path.to_path_buf(),
                holder,
            });
        }

        let lock = Self {
            file,
            path: lock_path.to_path_buf(),
        };
        lock.write_holder(command)?;
        Ok(lock)
    }

    fn write_holder(&self, command: &str) -> Result<()> {
        let holder = LockHolder {
            pid: std::process::id(),
            command: command.to_string(),
            acquired_at_utc: now_utc_compact(),
        };
        let json = serde_json::to_vec_pretty(&holder)
            .map_err(|e| BuilderError::infra(&self.path, std::io::Error::other(e)))?;

        let write = || -> std::io::Result<()> {
            let mut file = &self.file;
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&json)?;
            file.flush()
        };
        write().map_err(|e| BuilderError::infra(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = FileExt::unlock(&self.file);
    }
}
