use super::{RepeatHandle, RepeatingTask, Task};
use std::cmp::Ordering;
use std::time::{Duration, Instant};

pub(super) enum TimerKind<S> {
    Once(Task<S>),
    Repeat {
        interval: Duration,
        handle: RepeatHandle,
        task: RepeatingTask<S>,
    },
}

/// Heap entry ordered so the earliest deadline pops first; ties keep
/// scheduling order
pub(super) struct Timer<S> {
    due: Instant,
    sequence: u64,
    kind: TimerKind<S>,
}

impl<S> Timer<S> {
    pub(super) fn new(due: Instant, sequence: u64, kind: TimerKind<S>) -> Self {
        Self { due, sequence, kind }
    }

    pub(super) fn due(&self) -> Instant {
        self.due
    }

    pub(super) fn is_cancelled(&self) -> bool {
        match &self.kind {
            TimerKind::Once(_) => false,
            TimerKind::Repeat { handle, .. } => handle.is_cancelled(),
        }
    }

    pub(super) fn into_kind(self) -> TimerKind<S> {
        self.kind
    }
}

impl<S> PartialEq for Timer<S> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl<S> Eq for Timer<S> {}

impl<S> PartialOrd for Timer<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Timer<S> {
    // BinaryHeap is a max-heap, so reverse
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
