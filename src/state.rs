//! Shared session control - the only state touched from outside the session task
//!
//! Lets another thread (Ctrl-C handler, UI) stop a running session without a
//! lock. Each start opens a new epoch; work that began in an older epoch is
//! discarded when it completes.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub struct SessionControl {
    /// Detection is running
    active: AtomicBool,
    /// Bumped on every stop
    epoch: AtomicU64,
}

impl SessionControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        })
    }

    /// Mark running, returns the epoch the run belongs to
    pub fn start(&self) -> u64 {
        self.active.store(true, Ordering::SeqCst);
        self.epoch.load(Ordering::SeqCst)
    }

    /// Mark stopped and invalidate the current epoch
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Still running in the given epoch
    pub fn is_current(&self, epoch: u64) -> bool {
        self.is_active() && self.epoch() == epoch
    }
}

impl fmt::Debug for SessionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionControl")
            .field("active", &self.is_active())
            .field("epoch", &self.epoch())
            .finish()
    }
}

/// Type alias for shared control
pub type SharedControl = Arc<SessionControl>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_invalidates_epoch() {
        let control = SessionControl::new();
        assert!(!control.is_active());

        let epoch = control.start();
        assert!(control.is_current(epoch));

        control.stop();
        assert!(!control.is_current(epoch));

        let next = control.start();
        assert_ne!(next, epoch);
        assert!(!control.is_current(epoch));
        assert!(control.is_current(next));
    }
}
