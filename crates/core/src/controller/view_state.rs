use crate::host::ViewId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ViewState {
    saving: bool,
    latest_run: u64,
}

/// Per-view records that outlive a single callback: the saving flag and the
/// token of the newest run.
#[derive(Debug, Default)]
pub struct ViewStates {
    states: HashMap<ViewId, ViewState>,
    next_token: u64,
}

impl ViewStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new run for `view` and return its token
    pub fn begin_run(&mut self, view: ViewId) -> u64 {
        self.next_token += 1;
        self.states.entry(view).or_default().latest_run = self.next_token;
        self.next_token
    }

    /// Whether `token` still belongs to the newest run of `view`
    pub fn is_latest(&self, view: ViewId, token: u64) -> bool {
        self.states
            .get(&view)
            .is_some_and(|state| state.latest_run == token)
    }

    /// Mark the next save of `view` as our own
    pub fn set_saving(&mut self, view: ViewId) {
        self.states.entry(view).or_default().saving = true;
    }

    pub fn is_saving(&self, view: ViewId) -> bool {
        self.states.get(&view).is_some_and(|state| state.saving)
    }

    /// Read and clear the saving flag in one step
    pub fn take_saving(&mut self, view: ViewId) -> bool {
        match self.states.get_mut(&view) {
            Some(state) => std::mem::take(&mut state.saving),
            None => false,
        }
    }

    /// Drop everything known about a closed view
    pub fn forget(&mut self, view: ViewId) {
        self.states.remove(&view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_run_supersedes_older() {
        let mut states = ViewStates::new();
        let view = ViewId(1);
        let first = states.begin_run(view);
        assert!(states.is_latest(view, first));

        let second = states.begin_run(view);
        assert!(!states.is_latest(view, first));
        assert!(states.is_latest(view, second));

        // Runs on other views are independent
        let other = states.begin_run(ViewId(2));
        assert!(states.is_latest(view, second));
        assert!(states.is_latest(ViewId(2), other));
    }

    #[test]
    fn test_saving_flag_cleared_on_first_take() {
        let mut states = ViewStates::new();
        let view = ViewId(7);
        assert!(!states.take_saving(view));

        states.set_saving(view);
        assert!(states.is_saving(view));
        assert!(states.take_saving(view));
        assert!(!states.take_saving(view));
        assert!(!states.is_saving(view));
    }

    #[test]
    fn test_forget_drops_state() {
        let mut states = ViewStates::new();
        let view = ViewId(3);
        let token = states.begin_run(view);
        states.set_saving(view);
        states.forget(view);
        assert!(!states.is_latest(view, token));
        assert!(!states.is_saving(view));
    }
}
