use std::io;

/// Errors that can occur while running the formatter pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to launch formatter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Formatter exited with code {exit_code}")]
    FormatterReported { exit_code: i32, stderr: String },

    #[error("Formatter did not finish within {0} seconds")]
    Timeout(u64),

    #[error("Lint notification failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Detail text for the diagnostic channel.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::FormatterReported { exit_code, stderr } if stderr.trim().is_empty() => {
                format!("Formatter exited with code {exit_code} and no error output")
            }
            Error::FormatterReported { stderr, .. } => stderr.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
