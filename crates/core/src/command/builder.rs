use crate::{command::CommandVector, config::ResolvedConfig};
use tracing::debug;

/// Argument telling the formatter to read the source from stdin
pub const STDIN_MARKER: &str = "-";

/// Interpreter used on Windows when none is configured
pub const WINDOWS_DEFAULT_INTERPRETER: &str = "php";

/// Turns a resolved configuration into the formatter's argv
pub struct CommandBuilder<'a> {
    config: &'a ResolvedConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn build(&self) -> CommandVector {
        let mut args = Vec::new();

        // Interpreter
        if let Some(ref php) = self.config.interpreter_path {
            args.push(php.clone());
        } else if self.config.platform.is_windows() {
            args.push(WINDOWS_DEFAULT_INTERPRETER.to_string());
        }

        // Formatter executable
        if let Some(ref phpcbf) = self.config.formatter_path {
            args.push(phpcbf.clone());
        }

        // Coding standard
        if let Some(ref standard) = self.config.standard {
            args.push(format!("--standard={standard}"));
        }

        args.push(STDIN_MARKER.to_string());
        args.extend(self.config.extra_args.iter().cloned());

        let command = CommandVector::new(args);
        debug!("Built formatter command: {}", command);
        command
    }
}
