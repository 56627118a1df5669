//! Runs the external formatter against a buffer snapshot
//!
//! [`FormatterProcess::execute`] blocks until the formatter exits. Callers on
//! the main context must go through [`crate::runtime::Dispatcher::spawn_blocking`].

mod result;

pub use result::{FormatterExit, ProcessResult};

use crate::{
    command::CommandVector,
    config::ResolvedConfig,
    error::{Error, Result},
};
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Header line carrying the file identity to the formatter
pub const INPUT_FILE_HEADER: &str = "phpcs_input_file: ";

/// How the argv is handed to the operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationMode {
    /// Spawn the program directly; no shell ever sees the arguments
    #[default]
    Direct,
    /// Join the argv and hand it to the platform shell (legacy Windows behavior)
    Shell,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub mode: InvocationMode,
    /// `None` waits forever
    pub timeout_secs: Option<u64>,
}

impl ProcessOptions {
    /// Shell invocation is only honored on Windows
    pub fn for_config(config: &ResolvedConfig) -> Self {
        let mode = if config.use_shell && config.platform.is_windows() {
            InvocationMode::Shell
        } else {
            InvocationMode::Direct
        };
        Self {
            mode,
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Build the bytes written to the formatter's stdin
pub fn input_payload(buffer: &str, file_hint: Option<&Path>) -> String {
    match file_hint {
        Some(path) => format!("{INPUT_FILE_HEADER}{}\n{buffer}", path.display()),
        None => buffer.to_string(),
    }
}

pub struct FormatterProcess;

impl FormatterProcess {
    pub fn execute(
        command: &CommandVector,
        buffer: &str,
        file_hint: Option<&Path>,
        options: &ProcessOptions,
    ) -> Result<ProcessResult> {
        let program = command
            .program()
            .ok_or_else(|| Error::Config("Formatter command is empty".to_string()))?
            .to_string();

        let mut cmd = match options.mode {
            InvocationMode::Direct => {
                let mut cmd = Command::new(&program);
                cmd.args(command.args());
                cmd
            }
            InvocationMode::Shell => shell_command(command),
        };
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Spawning formatter ({:?}): {}", options.mode, command);
        let mut child = cmd
            .spawn()
            .map_err(|source| Error::Spawn { program, source })?;

        let payload = input_payload(buffer, file_hint).into_bytes();
        let writer = spawn_writer(&mut child, payload);
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match options.timeout_secs {
            Some(secs) => match child.wait_timeout(Duration::from_secs(secs))? {
                Some(status) => status,
                None => {
                    warn!("Formatter exceeded {secs}s, killing pid {}", child.id());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Timeout(secs));
                }
            },
            None => child.wait()?,
        };

        join(writer)?;
        let stdout = decode("stdout", join(stdout)?)?;
        let stderr = decode("stderr", join(stderr)?)?;
        let exit_code = status.code().unwrap_or(-1);
        debug!(
            "Formatter exited with {exit_code} ({} bytes stdout, {} bytes stderr)",
            stdout.len(),
            stderr.len()
        );

        Ok(ProcessResult {
            stdout,
            stderr,
            exit_code,
        })
    }
}

fn shell_command(command: &CommandVector) -> Command {
    let line = command.as_slice().join(" ");
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

fn spawn_writer(child: &mut Child, payload: Vec<u8>) -> JoinHandle<io::Result<()>> {
    let stdin = child.stdin.take();
    thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            match stdin.write_all(&payload) {
                // The formatter may exit before consuming its input
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("Formatter closed stdin early");
                }
                other => other?,
            }
        }
        Ok(())
    })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| Error::Other("Formatter I/O thread panicked".to_string()))?
        .map_err(Error::from)
}

fn decode(stream: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| Error::Encoding(format!("Formatter {stream} is not valid UTF-8: {e}")))
}
