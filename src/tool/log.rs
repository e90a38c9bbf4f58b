use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::Stdio;

/// Destination for subprocess output.
///
/// stdout and stderr of the child both go to the same sink.
#[derive(Debug, Default)]
pub enum LogSink {
    /// Output is discarded.
    #[default]
    Null,
    File(File),
}

impl LogSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn append(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(file))
    }

    /// Handles for the child's stdout and stderr.
    pub(crate) fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        match self {
            LogSink::Null => Ok((Stdio::null(), Stdio::null())),
            LogSink::File(file) => {
                let stdout = file.try_clone()?;
                let stderr = file.try_clone()?;
                Ok((Stdio::from(stdout), Stdio::from(stderr)))
            }
        }
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            LogSink::Null => Ok(()),
            LogSink::File(file) => {
                let mut file = file;
                writeln!(file, "{line}")?;
                file.flush()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    #[test]
    fn null_sink_swallows_lines() {
        LogSink::Null.write_line("ignored").unwrap();
    }

    #[test]
    fn append_keeps_previous_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("build.log");
        fs::write(&path, "earlier\n").unwrap();

        let sink = LogSink::append(&path).unwrap();
        sink.write_line("later").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn child_stdout_and_stderr_share_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("build.log");
        let sink = LogSink::append(&path).unwrap();
        sink.write_line("fake pbuilder build").unwrap();

        let (stdout, stderr) = sink.stdio().unwrap();
        let status = Command::new("sh")
            .arg("-c")
            .arg("echo out; echo err >&2")
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .unwrap();

        assert!(status.success());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "fake pbuilder build\nout\nerr\n"
        );
    }
}
