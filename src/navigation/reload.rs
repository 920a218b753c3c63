use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::warn;

/// Requests a full reload of the desk: every piece of in-memory state is
/// dropped and rebuilt from configuration and the persisted token.
pub trait Reloader: Send + Sync {
    fn reload(&self);
}

/// A reloader that records the request for the owner of the desk state to act on.
#[derive(Debug, Default)]
pub struct ReloadSignal {
    requested: AtomicBool,
    count: AtomicUsize,
}

impl ReloadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Number of reload requests since creation.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Returns whether a reload was pending and clears the flag.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

impl Reloader for ReloadSignal {
    fn reload(&self) {
        warn!(
            event_name = "navigation.reload.requested",
            event_domain = "navigation",
            "full reload requested"
        );
        self.requested.store(true, Ordering::SeqCst);
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_flag_but_keeps_count() {
        let signal = ReloadSignal::new();
        assert!(!signal.take());
        signal.reload();
        signal.reload();
        assert!(signal.is_requested());
        assert!(signal.take());
        assert!(!signal.is_requested());
        assert_eq!(signal.count(), 2);
    }
}
