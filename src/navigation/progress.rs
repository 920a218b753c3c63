use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use super::navigator::NavigationHook;

/// The progress bar shown while a navigation is in flight.
#[derive(Debug, Default)]
pub struct Progress {
    active: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active() > 0
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl NavigationHook for Progress {
    fn started(&self, target: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
        trace!("progress start: {}", target);
    }

    fn finished(&self, target: &str, outcome: &str) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        trace!("progress done: {} ({})", target, outcome);
    }
}
