//! Simulated independent watchdog.
//!
//! Clones share state: give one to the control task, keep one to check
//! whether the task kept servicing it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tipctl_traits::Watchdog;
use tipctl_traits::clock::{Clock, Tick};

#[derive(Clone)]
pub struct SimWatchdog {
    clock: Arc<dyn Clock + Send + Sync>,
    timeout: Tick,
    last_reset: Arc<AtomicU32>,
    resets: Arc<AtomicU64>,
}

impl core::fmt::Debug for SimWatchdog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimWatchdog")
            .field("timeout", &self.timeout)
            .field("resets", &self.resets())
            .finish()
    }
}

impl SimWatchdog {
    /// Armed now; fires if not reset within `timeout` ticks.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, timeout: Tick) -> Self {
        let now = clock.now();
        Self {
            clock,
            timeout,
            last_reset: Arc::new(AtomicU32::new(now)),
            resets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    /// Ticks since the last reset.
    pub fn starved_for(&self) -> Tick {
        self.clock
            .ticks_since(self.last_reset.load(Ordering::Relaxed))
    }

    /// Whether a hardware watchdog would have reset the MCU by now.
    pub fn expired(&self) -> bool {
        self.starved_for() > self.timeout
    }
}

impl Watchdog for SimWatchdog {
    fn reset(&mut self) {
        self.last_reset.store(self.clock.now(), Ordering::Relaxed);
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipctl_traits::ManualClock;

    #[test]
    fn expires_only_without_resets() {
        let clock = ManualClock::new();
        let mut wd = SimWatchdog::new(Arc::new(clock.clone()), 100);
        let probe = wd.clone();
        clock.advance(80);
        wd.reset();
        clock.advance(80);
        assert!(!probe.expired());
        assert_eq!(probe.resets(), 1);
        clock.advance(30);
        assert!(probe.expired());
    }
}
