use serde::Serialize;

/// Captured output of one formatter run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// phpcbf's exit code contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterExit {
    /// 0: ran, nothing to fix
    Clean,
    /// 1: ran, output differs from input
    FixesApplied,
    Error(i32),
}

impl From<i32> for FormatterExit {
    fn from(code: i32) -> Self {
        match code {
            0 => FormatterExit::Clean,
            1 => FormatterExit::FixesApplied,
            other => FormatterExit::Error(other),
        }
    }
}

impl ProcessResult {
    pub fn exit(&self) -> FormatterExit {
        FormatterExit::from(self.exit_code)
    }

    pub fn has_error(&self) -> bool {
        matches!(self.exit(), FormatterExit::Error(_))
    }
}
