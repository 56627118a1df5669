use anyhow::{Context, Result, bail};
use phpcbf_runner_core::{MainLoop, STATUS_RUNNING};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{CommonOptions, open_session, print_report};
use crate::host::{FileHost, WINDOW};
use crate::utils::{collect_targets, detect_project_folder};

pub fn fix_command(
    common: &CommonOptions,
    path: &Path,
    folders: Vec<PathBuf>,
    dry_run: bool,
    lint_cmd: Option<&str>,
) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;
    let targets = collect_targets(&root)?;
    if targets.is_empty() {
        println!("📭 No PHP files found in {}", root.display());
        return Ok(());
    }

    let folders = if folders.is_empty() {
        detect_project_folder(&root).into_iter().collect()
    } else {
        folders
    };
    debug!("Project folders: {:?}", folders);

    let session = open_session(common, FileHost::new(folders, dry_run), lint_cmd)?;
    let mut main_loop = MainLoop::new(session);
    let mut failures = 0;

    for file in &targets {
        let view = match main_loop.state_mut().host.open(file) {
            Ok(view) => view,
            Err(e) => {
                println!("❌ {}: {e}", file.display());
                failures += 1;
                continue;
            }
        };
        info!("Fixing {}", file.display());
        main_loop.with_state(|session, dispatcher| session.run(dispatcher, WINDOW, STATUS_RUNNING));
        main_loop.run_until_idle();
        // Nothing watches the disk here, so no post-save event will clear the flag
        main_loop.state_mut().fixer.views_mut().forget(view);
    }

    let mut session = main_loop.into_state();
    let written = session.host.flush()?;
    debug!("Flushed {written} unsaved buffer(s)");

    let reports = session.host.take_reports();
    for report in &reports {
        if print_report(report, dry_run) {
            failures += 1;
        }
    }

    let changed = reports.iter().filter(|r| r.diff.is_some()).count();
    if dry_run {
        println!("\n📌 {changed} of {} file(s) would change", targets.len());
    } else {
        println!("\n📌 {changed} of {} file(s) changed", targets.len());
    }

    if failures > 0 {
        bail!("{failures} file(s) could not be formatted");
    }
    Ok(())
}
