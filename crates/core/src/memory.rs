//! In-memory host for headless embedding and tests

use crate::{
    controller::{OutcomeKind, RunOutcome, Session},
    error::{Error, Result},
    host::{Host, ViewId, WindowId},
    listener::SaveTriggerListener,
    platform::Platform,
    runtime::Dispatcher,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct MemoryWindow {
    folders: Vec<PathBuf>,
    active: Option<ViewId>,
}

#[derive(Debug)]
struct MemoryView {
    window: WindowId,
    text: String,
    file_name: Option<PathBuf>,
    settings: Option<serde_json::Value>,
    saves: usize,
}

/// Windows and views held in plain maps.
///
/// Saves can be fed back to [`SaveTriggerListener`] through
/// [`MemoryHost::forward_saves_to`], the way an editor reports them.
pub struct MemoryHost {
    platform: Platform,
    windows: BTreeMap<WindowId, MemoryWindow>,
    views: BTreeMap<ViewId, MemoryView>,
    next_id: u64,
    save_events: Option<Dispatcher<Session<MemoryHost>>>,
    pub status_history: Vec<String>,
    pub console_log: Vec<String>,
    pub outcomes: Vec<(ViewId, OutcomeKind)>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl MemoryHost {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            windows: BTreeMap::new(),
            views: BTreeMap::new(),
            next_id: 0,
            save_events: None,
            status_history: Vec::new(),
            console_log: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn add_window(&mut self, folders: Vec<PathBuf>) -> WindowId {
        self.next_id += 1;
        let id = WindowId(self.next_id);
        self.windows.insert(
            id,
            MemoryWindow {
                folders,
                active: None,
            },
        );
        id
    }

    /// Open a view in `window` and make it the active one
    pub fn open_view(
        &mut self,
        window: WindowId,
        text: impl Into<String>,
        file_name: Option<PathBuf>,
    ) -> ViewId {
        self.next_id += 1;
        let id = ViewId(self.next_id);
        self.views.insert(
            id,
            MemoryView {
                window,
                text: text.into(),
                file_name,
                settings: None,
                saves: 0,
            },
        );
        self.set_active(window, id);
        id
    }

    pub fn set_active(&mut self, window: WindowId, view: ViewId) {
        self.windows.entry(window).or_default().active = Some(view);
    }

    pub fn close_view(&mut self, view: ViewId) {
        if let Some(closed) = self.views.remove(&view) {
            if let Some(window) = self.windows.get_mut(&closed.window) {
                if window.active == Some(view) {
                    window.active = None;
                }
            }
        }
    }

    pub fn set_view_settings(&mut self, view: ViewId, settings: serde_json::Value) {
        if let Some(v) = self.views.get_mut(&view) {
            v.settings = Some(settings);
        }
    }

    /// Simulate the user typing: replace the text without any event
    pub fn edit(&mut self, view: ViewId, text: impl Into<String>) {
        if let Some(v) = self.views.get_mut(&view) {
            v.text = text.into();
        }
    }

    pub fn text(&self, view: ViewId) -> Option<&str> {
        self.views.get(&view).map(|v| v.text.as_str())
    }

    pub fn save_count(&self, view: ViewId) -> usize {
        self.views.get(&view).map_or(0, |v| v.saves)
    }

    pub fn last_status(&self) -> Option<&str> {
        self.status_history.last().map(String::as_str)
    }

    /// Report every save to the save listener on the main context
    pub fn forward_saves_to(&mut self, dispatcher: Dispatcher<Session<MemoryHost>>) {
        self.save_events = Some(dispatcher);
    }

    fn view_mut(&mut self, view: ViewId) -> Result<&mut MemoryView> {
        self.views
            .get_mut(&view)
            .ok_or_else(|| Error::Host(format!("{view} is not open")))
    }
}

impl Host for MemoryHost {
    fn active_view(&self, window: WindowId) -> Option<ViewId> {
        self.windows.get(&window).and_then(|w| w.active)
    }

    fn view_window(&self, view: ViewId) -> Option<WindowId> {
        self.views.get(&view).map(|v| v.window)
    }

    fn folders(&self, window: WindowId) -> Vec<PathBuf> {
        self.windows
            .get(&window)
            .map(|w| w.folders.clone())
            .unwrap_or_default()
    }

    fn buffer_text(&self, view: ViewId) -> Option<String> {
        self.views.get(&view).map(|v| v.text.clone())
    }

    fn file_name(&self, view: ViewId) -> Option<PathBuf> {
        self.views.get(&view).and_then(|v| v.file_name.clone())
    }

    fn view_settings(&self, view: ViewId) -> Option<serde_json::Value> {
        self.views.get(&view).and_then(|v| v.settings.clone())
    }

    fn replace_content(&mut self, view: ViewId, content: &str) -> Result<()> {
        self.view_mut(view)?.text = content.to_string();
        Ok(())
    }

    fn save(&mut self, view: ViewId) -> Result<()> {
        self.view_mut(view)?.saves += 1;
        if let Some(ref dispatcher) = self.save_events {
            dispatcher.post(move |session, dispatcher| {
                SaveTriggerListener::on_post_save(session, dispatcher, view);
            });
        }
        Ok(())
    }

    fn set_status(&mut self, message: &str) {
        self.status_history.push(message.to_string());
    }

    fn console(&mut self, message: &str) {
        self.console_log.push(message.to_string());
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn run_finished(&mut self, view: ViewId, outcome: &RunOutcome) {
        self.outcomes.push((view, outcome.kind()));
    }
}
