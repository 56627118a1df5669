//! End-to-end reconciliation of one formatter run
//!
//! A run moves through snapshot, formatter wait, diff and (at most one)
//! buffer mutation. Everything here executes on the main context; only the
//! formatter process itself runs on a worker thread.

mod status;
mod view_state;

pub use status::{ANIMATION_INTERVAL, StatusAnimation};
pub use view_state::ViewStates;

use crate::{
    command::CommandBuilder,
    config::{ConfigResolver, SettingsStore},
    diff::DiffEngine,
    error::{Error, Result},
    host::{Host, LintNotifier, ViewId, WindowId},
    process::{FormatterProcess, ProcessOptions, ProcessResult},
    runtime::Dispatcher,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const STATUS_RUNNING: &str = "Running PHP CBF";
pub const STATUS_NO_CHANGES: &str = "PHP CBF: No changes needed";
pub const STATUS_ERROR: &str = "PHP CBF: Error, check console for details";
pub const STATUS_STALE: &str = "PHP CBF: Skipped stale result";

/// Delay between an automatic save and the lint notification
pub const NOTIFY_DELAY: Duration = Duration::from_millis(100);

/// Long-lived service state, created once at activation
pub struct Fixer {
    settings: SettingsStore,
    views: ViewStates,
    notifier: Option<Box<dyn LintNotifier>>,
}

impl Fixer {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            settings,
            views: ViewStates::new(),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn LintNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Re-read the global settings; runs already in flight keep the
    /// configuration they started with
    pub fn reload_settings(&mut self) -> Result<()> {
        self.settings.reload()
    }

    pub fn views(&self) -> &ViewStates {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewStates {
        &mut self.views
    }
}

/// Everything one in-flight run owns
#[derive(Debug, Clone)]
pub struct RunContext {
    pub window: WindowId,
    pub view: ViewId,
    pub snapshot: String,
    pub file_hint: Option<PathBuf>,
    pub token: u64,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The formatter's output replaced the buffer
    Applied { diff: String },
    NoChanges,
    /// A newer run for the same view started while this one was waiting
    Stale,
    /// The view went away while the formatter was running
    ViewClosed,
    Failed(Error),
}

/// Payload-free summary of a [`RunOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Applied,
    NoChanges,
    Stale,
    ViewClosed,
    Failed,
}

impl RunOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RunOutcome::Applied { .. } => OutcomeKind::Applied,
            RunOutcome::NoChanges => OutcomeKind::NoChanges,
            RunOutcome::Stale => OutcomeKind::Stale,
            RunOutcome::ViewClosed => OutcomeKind::ViewClosed,
            RunOutcome::Failed(_) => OutcomeKind::Failed,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.kind() == OutcomeKind::Applied
    }
}

/// Main-context state: the host surface plus the fixer service
pub struct Session<H: Host> {
    pub host: H,
    pub fixer: Fixer,
}

impl<H: Host + 'static> Session<H> {
    pub fn new(host: H, fixer: Fixer) -> Self {
        Self { host, fixer }
    }

    /// Start formatting the active view of `window`.
    ///
    /// Returns the run token, or `None` when there is no active view.
    pub fn run(
        &mut self,
        dispatcher: &Dispatcher<Self>,
        window: WindowId,
        message: &str,
    ) -> Option<u64> {
        let Some(view) = self.host.active_view(window) else {
            debug!("No active view in {window}, nothing to format");
            return None;
        };
        let Some(snapshot) = self.host.buffer_text(view) else {
            debug!("{view} has no buffer, nothing to format");
            return None;
        };
        let file_hint = self.host.file_name(view);

        let animation = StatusAnimation::start(dispatcher, message);

        let config = ConfigResolver::new(&self.fixer.settings).resolve(&self.host, window);
        let command = CommandBuilder::new(&config).build();
        let options = ProcessOptions::for_config(&config);
        let token = self.fixer.views.begin_run(view);

        info!("Formatting {view} (run {token}): {command}");
        let context = RunContext {
            window,
            view,
            snapshot,
            file_hint,
            token,
        };

        let input = context.snapshot.clone();
        let hint = context.file_hint.clone();
        dispatcher.spawn_blocking(
            move || FormatterProcess::execute(&command, &input, hint.as_deref(), &options),
            move |session: &mut Self, dispatcher: &Dispatcher<Self>, result| {
                animation.stop(&mut session.host);
                let outcome = session.reconcile(dispatcher, &context, result);
                session.host.run_finished(context.view, &outcome);
            },
        );

        Some(token)
    }

    /// Interpret the formatter result and apply it at most once
    pub fn reconcile(
        &mut self,
        dispatcher: &Dispatcher<Self>,
        context: &RunContext,
        result: Result<ProcessResult>,
    ) -> RunOutcome {
        let view = context.view;
        let result = match result {
            Ok(result) => result,
            Err(e) => return self.fail(e),
        };

        if result.has_error() {
            return self.fail(Error::FormatterReported {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        let Some(diff) = DiffEngine::diff(&context.snapshot, &result.stdout) else {
            debug!("{view}: formatter output matches the snapshot");
            self.host.set_status(STATUS_NO_CHANGES);
            return RunOutcome::NoChanges;
        };
        debug!("{view}: changes from formatter\n{diff}");

        if !self.fixer.views.is_latest(view, context.token) {
            debug!("{view}: run {} superseded, dropping its result", context.token);
            self.host.set_status(STATUS_STALE);
            return RunOutcome::Stale;
        }

        match self.host.buffer_text(view) {
            None => {
                debug!("{view} closed while the formatter was running");
                self.fixer.views.forget(view);
                return RunOutcome::ViewClosed;
            }
            Some(current) if current != context.snapshot => {
                warn!("{view} was edited while the formatter was running, overwriting");
            }
            Some(_) => {}
        }

        if let Err(e) = self.host.replace_content(view, &result.stdout) {
            return self.fail(e);
        }
        info!("{view}: applied formatter output");

        // Read now rather than at run start so a reload during the wait counts
        let fix_on_save = ConfigResolver::new(&self.fixer.settings)
            .resolve_for_view(&self.host, context.window, Some(view))
            .fix_on_save;
        if fix_on_save {
            self.fixer.views.set_saving(view);
            if let Err(e) = self.host.save(view) {
                // No save event will arrive to clear the flag
                self.fixer.views.take_saving(view);
                self.report(&e);
            }
            dispatcher.post_after(NOTIFY_DELAY, move |session: &mut Self, _| {
                session.notify_linter(view)
            });
        } else {
            self.notify_linter(view);
        }

        RunOutcome::Applied { diff }
    }

    /// Best effort: failures are logged at debug level and go no further
    pub fn notify_linter(&mut self, view: ViewId) {
        let Some(ref notifier) = self.fixer.notifier else {
            return;
        };
        let file = self.host.file_name(view);
        if let Err(e) = notifier.notify_content_changed(view, file.as_deref()) {
            let swallowed = Error::Notification(e.to_string());
            debug!("{view}: {swallowed}");
        }
    }

    fn fail(&mut self, error: Error) -> RunOutcome {
        self.report(&error);
        RunOutcome::Failed(error)
    }

    fn report(&mut self, error: &Error) {
        error!("PHP CBF run failed: {error}");
        self.host
            .console(&format!("--- PHP CBF Error ---\n{}", error.diagnostic()));
        self.host.set_status(STATUS_ERROR);
    }
}

#[cfg(test)]
mod tests;
