//! Faster-than-real-time ADC notification for simulations.
//!
//! Each wait advances a shared `ManualClock` by one conversion period and
//! reports `Ready`. Scheduled dropouts instead burn the whole timeout and
//! report `Timeout`, like a stalled ADC interrupt would.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tipctl_traits::clock::Tick;
use tipctl_traits::{ManualClock, SampleGate, SampleWait};

#[derive(Debug, Clone)]
pub struct SimulatedAdcGate {
    clock: ManualClock,
    period: Tick,
    dropouts: Arc<AtomicU32>,
}

impl SimulatedAdcGate {
    pub fn new(clock: ManualClock, period: Tick) -> Self {
        Self {
            clock,
            period: period.max(1),
            dropouts: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Swallow the next `n` notifications.
    pub fn drop_next(&self, n: u32) {
        self.dropouts.fetch_add(n, Ordering::Relaxed);
    }

    pub fn pending_dropouts(&self) -> u32 {
        self.dropouts.load(Ordering::Relaxed)
    }
}

impl SampleGate for SimulatedAdcGate {
    fn wait_for_sample(&mut self, timeout: Tick) -> SampleWait {
        let dropped = self
            .dropouts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if dropped || self.period > timeout {
            self.clock.advance(timeout);
            return SampleWait::Timeout;
        }
        self.clock.advance(self.period);
        SampleWait::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipctl_traits::Clock;

    #[test]
    fn ready_advances_one_period() {
        let clock = ManualClock::new();
        let mut gate = SimulatedAdcGate::new(clock.clone(), 125);
        assert_eq!(gate.wait_for_sample(2000), SampleWait::Ready);
        assert_eq!(clock.now(), 125);
    }

    #[test]
    fn dropout_burns_timeout() {
        let clock = ManualClock::new();
        let mut gate = SimulatedAdcGate::new(clock.clone(), 125);
        gate.drop_next(2);
        assert_eq!(gate.wait_for_sample(2000), SampleWait::Timeout);
        assert_eq!(gate.wait_for_sample(2000), SampleWait::Timeout);
        assert_eq!(gate.wait_for_sample(2000), SampleWait::Ready);
        assert_eq!(clock.now(), 4125);
        assert_eq!(gate.pending_dropouts(), 0);
    }
}
