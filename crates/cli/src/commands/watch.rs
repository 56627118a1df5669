use anyhow::{Context, Result, bail};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use phpcbf_runner_core::{
    Dispatcher, Host, MainLoop, SaveDecision, SaveTriggerListener, Session,
    listener::is_auto_fix_candidate,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CommonOptions, open_session, print_report};
use crate::host::FileHost;
use crate::utils::detect_project_folder;

/// Filesystem events closer together than this are handled as one batch
const DEBOUNCE: Duration = Duration::from_millis(150);
const REPORT_INTERVAL: Duration = Duration::from_millis(500);

type WatchSession = Session<FileHost>;

pub fn watch_command(common: &CommonOptions, dir: &Path, lint_cmd: Option<&str>) -> Result<()> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("Cannot access {}", dir.display()))?;
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let folders = detect_project_folder(&root).into_iter().collect();
    let session = open_session(common, FileHost::new(folders, false), lint_cmd)?;
    let settings_source = session.fixer.settings().source().map(Path::to_path_buf);
    if !session.fixer.settings().settings().fix_on_save {
        println!("⚠️  fix_on_save is off globally, only projects enabling it in .phpcbf.json will be fixed");
    }

    let mut main_loop = MainLoop::new(session);
    let dispatcher = main_loop.dispatcher();

    let (tx, rx) = mpsc::channel::<PathBuf>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) => {
            for path in event.paths {
                let _ = tx.send(path);
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Watch error: {e}"),
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    if let Some(parent) = settings_source.as_deref().and_then(Path::parent) {
        if parent.is_dir() && !parent.starts_with(&root) {
            if let Err(e) = watcher.watch(parent, RecursiveMode::NonRecursive) {
                warn!("Settings at {} will not be reloaded: {e}", parent.display());
            }
        }
    }

    let batches = dispatcher.clone();
    thread::Builder::new()
        .name("phpcbf-debounce".to_string())
        .spawn(move || debounce(rx, batches, settings_source))
        .context("Failed to start the event thread")?;

    dispatcher.repeat(REPORT_INTERVAL, |session: &mut WatchSession, _: &Dispatcher<WatchSession>| {
        for report in session.host.take_reports() {
            print_report(&report, false);
        }
    });

    println!("👀 Watching {} (Ctrl+C to stop)", root.display());
    main_loop.run_forever();
    Ok(())
}

/// Collapse bursts of events into one batch per quiet period
fn debounce(rx: mpsc::Receiver<PathBuf>, dispatcher: Dispatcher<WatchSession>, settings_source: Option<PathBuf>) {
    while let Ok(first) = rx.recv() {
        let mut batch = BTreeSet::from([first]);
        while let Ok(path) = rx.recv_timeout(DEBOUNCE) {
            batch.insert(path);
        }
        let settings_source = settings_source.clone();
        dispatcher.post(move |session: &mut WatchSession, dispatcher: &Dispatcher<WatchSession>| {
            handle_batch(session, dispatcher, batch, settings_source.as_deref());
        });
    }
    debug!("Watcher closed, event thread exiting");
}

fn handle_batch(
    session: &mut WatchSession,
    dispatcher: &Dispatcher<WatchSession>,
    batch: BTreeSet<PathBuf>,
    settings_source: Option<&Path>,
) {
    for path in batch {
        if settings_source == Some(path.as_path()) {
            match session.fixer.reload_settings() {
                Ok(()) => println!("🔄 Reloaded settings from {}", path.display()),
                Err(e) => warn!("Keeping previous settings: {e}"),
            }
            continue;
        }

        let previous = session
            .host
            .view_for(&path)
            .and_then(|view| session.host.buffer_text(view));
        if previous.is_none() && !is_auto_fix_candidate(&path) {
            continue;
        }
        let view = match session.host.open(&path) {
            Ok(view) => view,
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
                continue;
            }
        };

        let mut decision = SaveTriggerListener::on_post_save(session, dispatcher, view);
        if decision == SaveDecision::OwnSave && session.host.buffer_text(view) != previous {
            // A user save landed in the same batch as our own
            decision = SaveTriggerListener::on_post_save(session, dispatcher, view);
        }
        match decision {
            SaveDecision::Triggered => info!("Saved {}, fixing", path.display()),
            SaveDecision::OwnSave => debug!("Own save of {}", path.display()),
            SaveDecision::Ignored => debug!("Not fixing {}", path.display()),
        }
    }
}
