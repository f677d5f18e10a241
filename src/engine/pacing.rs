use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Cooperative shutdown flag whose sleeps wake as soon as shutdown is requested.
#[derive(Debug, Default)]
pub(crate) struct ShutdownSignal {
    requested: AtomicBool,
    lock: Mutex<()>,
    cvar: Condvar,
}

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every sleeper. Idempotent.
    pub(crate) fn request(&self) {
        self.requested.store(true, Ordering::Release);
        // Notify under the lock so a sleeper between its flag check and its wait is not missed.
        let _guard = self.lock.lock();
        self.cvar.notify_all();
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Sleep for `dur` or until shutdown is requested. Returns `true` when shutdown was requested.
    pub(crate) fn sleep(&self, dur: Duration) -> bool {
        let deadline = Instant::now() + dur;
        let mut guard = self.lock.lock();
        while !self.is_requested() {
            if self.cvar.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_requested()
    }
}

/// Time left in the frame after `elapsed` of work, never below `min_sleep`. Late frames are not
/// caught up.
pub(crate) fn frame_sleep(period: Duration, elapsed: Duration, min_sleep: Duration) -> Duration {
    period.saturating_sub(elapsed).max(min_sleep)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/pacing.rs"]
mod tests;
