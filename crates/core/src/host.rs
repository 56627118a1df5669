//! The integration boundary with the editing surface
//!
//! The pipeline never owns a buffer. It reads snapshots and issues full
//! replacements through [`Host`], and only ever does so from the main context.

use crate::{controller::RunOutcome, error::Result, platform::Platform};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identifier of a host window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// Stable identifier of a host view (one open buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Editing surface the pipeline runs against.
///
/// Every method is called on the main context only.
pub trait Host {
    fn active_view(&self, window: WindowId) -> Option<ViewId>;

    fn view_window(&self, view: ViewId) -> Option<WindowId>;

    /// Project folders of the window, in the order the host lists them
    fn folders(&self, window: WindowId) -> Vec<PathBuf>;

    /// Full text of the view's buffer, `None` if the view is gone
    fn buffer_text(&self, view: ViewId) -> Option<String>;

    fn file_name(&self, view: ViewId) -> Option<PathBuf>;

    /// The view's local settings; the override bag lives under one
    /// namespaced key inside it
    fn view_settings(&self, view: ViewId) -> Option<serde_json::Value>;

    /// Replace the entire buffer content in a single atomic edit
    fn replace_content(&mut self, view: ViewId, content: &str) -> Result<()>;

    /// Save the view. The host later reports the save through the
    /// save listener like any other save.
    fn save(&mut self, view: ViewId) -> Result<()>;

    fn set_status(&mut self, message: &str);

    /// Diagnostic channel (the editor console)
    fn console(&mut self, message: &str);

    fn platform(&self) -> Platform {
        Platform::current()
    }

    /// Called once per started run, after its last main-context step
    fn run_finished(&mut self, _view: ViewId, _outcome: &RunOutcome) {}
}

/// Optional collaborator that re-lints a view after its content changed
pub trait LintNotifier {
    fn notify_content_changed(&self, view: ViewId, file: Option<&Path>) -> anyhow::Result<()>;
}
