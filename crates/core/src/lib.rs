//! phpcbf-runner - run PHP_CodeSniffer's phpcbf against an editor buffer
//!
//! This crate provides:
//! - Layered settings and per-project standard selection
//! - Formatter command construction and off-main-context execution
//! - Diff-based reconciliation that mutates a buffer at most once per run
//! - Save-triggered auto-fix that does not re-trigger on its own saves
pub mod command;
pub mod config;
pub mod controller;
pub mod diff;
pub mod error;
pub mod host;
pub mod listener;
pub mod memory;
pub mod platform;
pub mod process;
pub mod runtime;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use host::{Host, LintNotifier, ViewId, WindowId};
pub use platform::Platform;

// Re-export main API components
pub use command::{CommandBuilder, CommandVector};
pub use config::{ConfigResolver, ResolvedConfig, Settings, SettingsStore, StandardSetting};
pub use controller::{Fixer, OutcomeKind, RunOutcome, STATUS_RUNNING, Session};
pub use diff::DiffEngine;
pub use listener::{SaveDecision, SaveTriggerListener};
pub use memory::MemoryHost;
pub use process::{FormatterProcess, ProcessResult};
pub use runtime::{Dispatcher, MainLoop};
