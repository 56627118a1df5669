//! Lint notification by spawning a user-supplied command

use phpcbf_runner_core::{LintNotifier, ViewId};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs `<program> [args..] <file>` after each mutation without waiting
/// for it
pub struct CommandLintNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandLintNotifier {
    /// Parse a whitespace separated command line such as `phpcs -q`
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl LintNotifier for CommandLintNotifier {
    fn notify_content_changed(&self, view: ViewId, file: Option<&Path>) -> anyhow::Result<()> {
        let file = file.ok_or_else(|| anyhow::anyhow!("{view} has no file to lint"))?;
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .stdin(Stdio::null())
            .spawn()?;
        debug!("Started linter {} (pid {}) for {}", self.program, child.id(), file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let notifier = CommandLintNotifier::parse("phpcs  -q --report=emacs").unwrap();
        assert_eq!(notifier.program, "phpcs");
        assert_eq!(notifier.args, vec!["-q", "--report=emacs"]);
        assert!(CommandLintNotifier::parse("   ").is_none());
    }

    #[test]
    fn test_missing_linter_is_an_error_for_the_caller() {
        let notifier = CommandLintNotifier::parse("/definitely/not/here/phpcs").unwrap();
        assert!(
            notifier
                .notify_content_changed(ViewId(1), Some(Path::new("a.php")))
                .is_err()
        );
        assert!(notifier.notify_content_changed(ViewId(1), None).is_err());
    }
}
