//! Decides whether a save should start a run

use crate::{
    config::ConfigResolver,
    controller::{STATUS_RUNNING, Session},
    host::{Host, ViewId},
    runtime::Dispatcher,
};
use std::path::Path;
use tracing::debug;

/// What the listener did with a save event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    /// The save was our own; the saving flag has been cleared
    OwnSave,
    /// A new run was started
    Triggered,
    Ignored,
}

pub struct SaveTriggerListener;

impl SaveTriggerListener {
    pub fn on_post_save<H: Host + 'static>(
        session: &mut Session<H>,
        dispatcher: &Dispatcher<Session<H>>,
        view: ViewId,
    ) -> SaveDecision {
        // Cleared before anything else so it never survives a save cycle
        if session.fixer.views_mut().take_saving(view) {
            debug!("{view}: save issued by the fixer, not re-running");
            return SaveDecision::OwnSave;
        }

        let Some(window) = session.host.view_window(view) else {
            return SaveDecision::Ignored;
        };
        if !ConfigResolver::new(session.fixer.settings()).fix_on_save(&session.host, window) {
            return SaveDecision::Ignored;
        }
        let Some(file) = session.host.file_name(view) else {
            return SaveDecision::Ignored;
        };
        if !is_auto_fix_candidate(&file) {
            debug!("{}: not a PHP file, skipping auto-fix", file.display());
            return SaveDecision::Ignored;
        }

        match session.run(dispatcher, window, STATUS_RUNNING) {
            Some(_) => SaveDecision::Triggered,
            None => SaveDecision::Ignored,
        }
    }
}

/// `*.php` (case-sensitive) and not a dotfile
pub fn is_auto_fix_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".php") && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_filter() {
        assert!(is_auto_fix_candidate(Path::new("/proj/src/Foo.php")));
        assert!(is_auto_fix_candidate(Path::new("index.php")));
        assert!(!is_auto_fix_candidate(Path::new("/proj/.hidden.php")));
        assert!(!is_auto_fix_candidate(Path::new("/proj/Foo.PHP")));
        assert!(!is_auto_fix_candidate(Path::new("/proj/Foo.Php")));
        assert!(!is_auto_fix_candidate(Path::new("/proj/view.phtml")));
        assert!(!is_auto_fix_candidate(Path::new("/proj/notes.php.txt")));
    }
}
