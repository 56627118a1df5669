pub mod config_cmd;
pub mod fix;
pub mod init;
pub mod watch;

pub use config_cmd::config_command;
pub use fix::fix_command;
pub use init::init_command;
pub use watch::watch_command;

use anyhow::{Context, Result};
use phpcbf_runner_core::{Fixer, OutcomeKind, Session, Settings, SettingsStore};
use std::path::PathBuf;
use tracing::debug;

use crate::host::{FileHost, FileReport};
use crate::notifier::CommandLintNotifier;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct CommonOptions {
    pub settings: Option<PathBuf>,
}

impl CommonOptions {
    /// Global settings: `--settings`, else the default location, else the
    /// built-in defaults
    pub fn settings_store(&self) -> Result<SettingsStore> {
        match self.settings.clone().or_else(SettingsStore::default_source) {
            Some(path) => {
                debug!("Settings source: {}", path.display());
                SettingsStore::load(&path)
                    .with_context(|| format!("Failed to load settings from {}", path.display()))
            }
            None => Ok(SettingsStore::in_memory(Settings::default())),
        }
    }
}

pub(crate) fn open_session(
    common: &CommonOptions,
    host: FileHost,
    lint_cmd: Option<&str>,
) -> Result<Session<FileHost>> {
    let mut fixer = Fixer::new(common.settings_store()?);
    if let Some(command_line) = lint_cmd {
        let notifier = CommandLintNotifier::parse(command_line)
            .with_context(|| format!("Invalid --lint-cmd: {command_line:?}"))?;
        fixer = fixer.with_notifier(Box::new(notifier));
    }
    Ok(Session::new(host, fixer))
}

/// One line per file, plus the diff in dry-run mode. Returns whether the
/// file failed.
pub(crate) fn print_report(report: &FileReport, dry_run: bool) -> bool {
    let path = report.path.display();
    match report.kind {
        OutcomeKind::Applied if dry_run => {
            println!("📝 Would fix {path}");
            if let Some(ref diff) = report.diff {
                println!("{diff}");
            }
        }
        OutcomeKind::Applied => println!("✅ Fixed {path}"),
        OutcomeKind::NoChanges => println!("✨ No changes needed: {path}"),
        OutcomeKind::Stale => println!("⏭️  Superseded by a newer run: {path}"),
        OutcomeKind::ViewClosed => println!("⏭️  Closed before the result arrived: {path}"),
        OutcomeKind::Failed => println!("❌ Failed: {path}"),
    }
    report.kind == OutcomeKind::Failed
}
