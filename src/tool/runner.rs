use std::ffi::OsStr;
use std::io;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{BuilderError, Result};

use super::{Invocation, LogSink};

/// The chroot tool.
pub const TOOL_PROGRAM: &str = "pbuilder";

/// pbuilder needs root; every invocation goes through sudo.
pub const ELEVATE_PROGRAM: &str = "sudo";

/// Executes an [`Invocation`] and reports its exit code.
///
/// A nonzero code is not an error at this level; callers decide.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation, log: &LogSink) -> Result<i32>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, invocation: &Invocation, log: &LogSink) -> Result<i32> {
        (**self).run(invocation, log)
    }
}

/// Runs `sudo pbuilder ...` in its own process group and waits for it.
///
/// The child leads a new process group so the whole tree, including the
/// privileged children sudo spawns, can be signalled as one unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PbuilderRunner;

impl ToolRunner for PbuilderRunner {
    fn run(&self, invocation: &Invocation, log: &LogSink) -> Result<i32> {
        let mut cmd = detached_command(ELEVATE_PROGRAM, log).map_err(|source| {
            BuilderError::Spawn {
                program: ELEVATE_PROGRAM.to_string(),
                source,
            }
        })?;
        cmd.arg(TOOL_PROGRAM).args(invocation.args());

        debug!(mode = %invocation.mode(), command = ?cmd, "running pbuilder");

        let status = cmd.status().map_err(|source| BuilderError::Spawn {
            program: format!("{ELEVATE_PROGRAM} {TOOL_PROGRAM}"),
            source,
        })?;

        let code = exit_code(status);
        debug!(mode = %invocation.mode(), code, "pbuilder exited");
        Ok(code)
    }
}

/// `program` with no stdin, stdout and stderr both going to `log`, leading
/// a new process group.
pub(crate) fn detached_command(program: impl AsRef<OsStr>, log: &LogSink) -> io::Result<Command> {
    let (stdout, stderr) = log.stdio()?;
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .process_group(0);
    Ok(cmd)
}

/// Exit code of a finished process; signal deaths map to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn status_of(script: &str) -> ExitStatus {
        Command::new("sh").arg("-c").arg(script).status().unwrap()
    }

    #[test]
    fn exit_code_is_verbatim() {
        assert_eq!(exit_code(status_of("exit 0")), 0);
        assert_eq!(exit_code(status_of("exit 2")), 2);
    }

    #[test]
    fn signal_maps_above_128() {
        assert_eq!(exit_code(status_of("kill -KILL $$")), 128 + libc::SIGKILL);
    }

    #[test]
    fn detached_command_leads_its_own_process_group() {
        let mut child = detached_command("sh", &LogSink::Null)
            .unwrap()
            .arg("-c")
            .arg("sleep 5")
            .spawn()
            .unwrap();

        let pid = libc::pid_t::try_from(child.id()).unwrap();
        // SAFETY: getpgid only queries the process table.
        let pgid = unsafe { libc::getpgid(pid) };
        child.kill().unwrap();
        child.wait().unwrap();

        assert_eq!(pgid, pid);
        // SAFETY: as above, for the test process itself.
        assert_ne!(pgid, unsafe { libc::getpgid(0) });
    }

    #[test]
    fn detached_command_merges_output_into_log() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("build.log");
        let sink = LogSink::append(&path).unwrap();

        let status = detached_command("sh", &sink)
            .unwrap()
            .arg("-c")
            .arg("echo out; echo err >&2; echo out2")
            .status()
            .unwrap();

        assert!(status.success());
        assert_eq!(fs::read_to_string(&path).unwrap(), "out\nerr\nout2\n");
    }
}
