//! File-backed host: every view is a file on disk, one window per invocation

use phpcbf_runner_core::{
    Error, Host, OutcomeKind, RunOutcome, ViewId, WindowId,
    config::{PROJECT_SETTINGS_FILE, Settings},
};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The single window a CLI invocation works in
pub const WINDOW: WindowId = WindowId(1);

#[derive(Debug)]
struct FileView {
    path: PathBuf,
    text: String,
    dirty: bool,
    settings: Option<serde_json::Value>,
}

/// What happened to one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub kind: OutcomeKind,
    pub diff: Option<String>,
}

pub struct FileHost {
    folders: Vec<PathBuf>,
    views: BTreeMap<ViewId, FileView>,
    by_path: HashMap<PathBuf, ViewId>,
    active: Option<ViewId>,
    next_id: u64,
    dry_run: bool,
    interactive: bool,
    reports: Vec<FileReport>,
}

impl FileHost {
    pub fn new(folders: Vec<PathBuf>, dry_run: bool) -> Self {
        Self {
            folders,
            views: BTreeMap::new(),
            by_path: HashMap::new(),
            active: None,
            next_id: 0,
            dry_run,
            interactive: std::io::stderr().is_terminal(),
            reports: Vec::new(),
        }
    }

    /// Open `path` (or refresh it from disk if already open) and make it
    /// the active view
    pub fn open(&mut self, path: &Path) -> phpcbf_runner_core::Result<ViewId> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| {
            Error::Encoding(format!("{} is not UTF-8, diff only works with UTF-8 files", path.display()))
        })?;
        let settings = load_view_settings(path);

        let id = match self.by_path.get(path) {
            Some(&id) => id,
            None => {
                self.next_id += 1;
                let id = ViewId(self.next_id);
                self.by_path.insert(path.to_path_buf(), id);
                id
            }
        };
        self.views.insert(
            id,
            FileView {
                path: path.to_path_buf(),
                text,
                dirty: false,
                settings,
            },
        );
        self.active = Some(id);
        Ok(id)
    }

    pub fn view_for(&self, path: &Path) -> Option<ViewId> {
        self.by_path.get(path).copied()
    }

    /// Write every modified buffer back to disk
    pub fn flush(&mut self) -> phpcbf_runner_core::Result<usize> {
        if self.dry_run {
            return Ok(0);
        }
        let mut written = 0;
        for view in self.views.values_mut().filter(|v| v.dirty) {
            fs::write(&view.path, &view.text)?;
            view.dirty = false;
            written += 1;
        }
        Ok(written)
    }

    pub fn take_reports(&mut self) -> Vec<FileReport> {
        std::mem::take(&mut self.reports)
    }

    fn view_mut(&mut self, view: ViewId) -> phpcbf_runner_core::Result<&mut FileView> {
        self.views
            .get_mut(&view)
            .ok_or_else(|| Error::Host(format!("{view} is not open")))
    }
}

/// The override bag comes from the nearest project settings file
fn load_view_settings(path: &Path) -> Option<serde_json::Value> {
    let file = Settings::find_project_file(path)?;
    let contents = match fs::read_to_string(&file) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Cannot read {}: {e}", file.display());
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => {
            debug!("Using {} for {}", file.display(), path.display());
            Some(value)
        }
        Err(e) => {
            warn!("Ignoring malformed {PROJECT_SETTINGS_FILE} at {}: {e}", file.display());
            None
        }
    }
}

impl Host for FileHost {
    fn active_view(&self, window: WindowId) -> Option<ViewId> {
        if window == WINDOW { self.active } else { None }
    }

    fn view_window(&self, view: ViewId) -> Option<WindowId> {
        self.views.contains_key(&view).then_some(WINDOW)
    }

    fn folders(&self, window: WindowId) -> Vec<PathBuf> {
        if window == WINDOW {
            self.folders.clone()
        } else {
            Vec::new()
        }
    }

    fn buffer_text(&self, view: ViewId) -> Option<String> {
        self.views.get(&view).map(|v| v.text.clone())
    }

    fn file_name(&self, view: ViewId) -> Option<PathBuf> {
        self.views.get(&view).map(|v| v.path.clone())
    }

    fn view_settings(&self, view: ViewId) -> Option<serde_json::Value> {
        self.views.get(&view).and_then(|v| v.settings.clone())
    }

    fn replace_content(&mut self, view: ViewId, content: &str) -> phpcbf_runner_core::Result<()> {
        let file = self.view_mut(view)?;
        file.text = content.to_string();
        file.dirty = true;
        Ok(())
    }

    fn save(&mut self, view: ViewId) -> phpcbf_runner_core::Result<()> {
        let dry_run = self.dry_run;
        let file = self.view_mut(view)?;
        if dry_run {
            debug!("Dry run, not saving {}", file.path.display());
            return Ok(());
        }
        fs::write(&file.path, &file.text)?;
        file.dirty = false;
        Ok(())
    }

    fn set_status(&mut self, message: &str) {
        if self.interactive {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r\x1b[2K{message}");
            let _ = stderr.flush();
        } else if !message.is_empty() {
            debug!("status: {message}");
        }
    }

    fn console(&mut self, message: &str) {
        if self.interactive {
            eprintln!();
        }
        eprintln!("{message}");
    }

    fn run_finished(&mut self, view: ViewId, outcome: &RunOutcome) {
        if self.interactive {
            eprint!("\r\x1b[2K");
        }
        let Some(file) = self.views.get(&view) else {
            return;
        };
        let diff = match outcome {
            RunOutcome::Applied { diff } => Some(diff.clone()),
            _ => None,
        };
        self.reports.push(FileReport {
            path: file.path.clone(),
            kind: outcome.kind(),
            diff,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_refreshes_and_reuses_view() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.php");
        fs::write(&file, "<?php\n").unwrap();

        let mut host = FileHost::new(vec![temp.path().to_path_buf()], false);
        let view = host.open(&file).unwrap();
        fs::write(&file, "<?php echo 1;\n").unwrap();
        assert_eq!(host.open(&file).unwrap(), view);
        assert_eq!(host.buffer_text(view).as_deref(), Some("<?php echo 1;\n"));
        assert_eq!(host.active_view(WINDOW), Some(view));
        assert_eq!(host.active_view(WindowId(9)), None);
    }

    #[test]
    fn test_non_utf8_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("latin1.php");
        fs::write(&file, b"<?php echo '\xe9';").unwrap();
        let mut host = FileHost::new(vec![], false);
        assert!(matches!(host.open(&file), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_flush_and_dry_run() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.php");
        fs::write(&file, "old").unwrap();

        let mut dry = FileHost::new(vec![], true);
        let view = dry.open(&file).unwrap();
        dry.replace_content(view, "new").unwrap();
        dry.save(view).unwrap();
        assert_eq!(dry.flush().unwrap(), 0);
        assert_eq!(fs::read_to_string(&file).unwrap(), "old");

        let mut host = FileHost::new(vec![], false);
        let view = host.open(&file).unwrap();
        host.replace_content(view, "new").unwrap();
        assert_eq!(host.flush().unwrap(), 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
        assert_eq!(host.flush().unwrap(), 0);
    }

    #[test]
    fn test_view_settings_from_project_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_SETTINGS_FILE),
            r#"{"PHP_CBF": {"phpcs_standard": "PSR12"}}"#,
        )
        .unwrap();
        let file = temp.path().join("a.php");
        fs::write(&file, "<?php\n").unwrap();

        let mut host = FileHost::new(vec![], false);
        let view = host.open(&file).unwrap();
        let settings = host.view_settings(view).unwrap();
        assert_eq!(settings["PHP_CBF"]["phpcs_standard"], "PSR12");
    }
}
