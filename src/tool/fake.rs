//! Recording [`ToolRunner`] used by tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;

use crate::error::Result;

use super::{Invocation, LogSink, Mode, ToolRunner};

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub mode: Mode,
    pub args: Vec<String>,
}

/// Returns scripted exit codes per mode (default 0) and, on a successful
/// build, drops a changes file into the result directory.
#[derive(Debug, Default)]
pub(crate) struct FakeRunner {
    calls: RefCell<Vec<RecordedCall>>,
    exit_codes: HashMap<Mode, i32>,
    changes_file: Option<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_code(mut self, mode: Mode, code: i32) -> Self {
        self.exit_codes.insert(mode, code);
        self
    }

    pub fn writes_changes(mut self, file_name: &str) -> Self {
        self.changes_file = Some(file_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn modes(&self) -> Vec<Mode> {
        self.calls.borrow().iter().map(|c| c.mode).collect()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &Invocation, log: &LogSink) -> Result<i32> {
        let args = invocation
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.borrow_mut().push(RecordedCall {
            mode: invocation.mode(),
            args,
        });
        let _ = log.write_line(&format!("fake pbuilder {}", invocation.mode()));

        let code = self
            .exit_codes
            .get(&invocation.mode())
            .copied()
            .unwrap_or(0);

        if let (Mode::Build, 0, Some(name), Some(dir)) = (
            invocation.mode(),
            code,
            &self.changes_file,
            invocation.result_dir(),
        ) {
            fs::create_dir_all(dir).unwrap();
            fs::write(dir.join(name), "Format: 1.8\n").unwrap();
        }
        Ok(code)
    }
}
