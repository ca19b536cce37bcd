use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Scheduler tick count. Wraps at `u32::MAX`; compare with `wrapping_sub`.
pub type Tick = u32;

/// Tick rate of every clock in this workspace (1 tick = 1 ms).
pub const TICKS_PER_SECOND: Tick = 1_000;
/// Ticks in 100 ms.
pub const TICKS_100MS: Tick = TICKS_PER_SECOND / 10;

/// Monotonic tick source for control and timing across the stack.
///
/// - now(): current tick count (wrapping)
/// - sleep(): block for the given number of ticks (implementations may simulate)
/// - ticks_since(): wrap-safe elapsed ticks from an earlier reading
pub trait Clock {
    fn now(&self) -> Tick;
    fn sleep(&self, ticks: Tick);

    /// Ticks elapsed since `earlier`, correct across a single counter wrap.
    #[inline]
    fn ticks_since(&self, earlier: Tick) -> Tick {
        self.now().wrapping_sub(earlier)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> Tick {
        (**self).now()
    }

    #[inline]
    fn sleep(&self, ticks: Tick) {
        (**self).sleep(ticks);
    }
}

/// Convert a tick count into a wall-clock duration.
#[inline]
pub fn ticks_to_duration(ticks: Tick) -> Duration {
    Duration::from_millis(u64::from(ticks) * 1_000 / u64::from(TICKS_PER_SECOND))
}

/// Real-time clock backed by `std::time::Instant`, counting from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Tick {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as Tick
    }

    #[inline]
    fn sleep(&self, ticks: Tick) {
        if ticks == 0 {
            return;
        }
        thread::sleep(ticks_to_duration(ticks));
    }
}

/// Deterministic clock whose time only moves when told to.
///
/// Clones share the same counter, so a simulation can hand one copy to the
/// controller and keep another to advance time. `sleep(n)` advances by `n`
/// without blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at an arbitrary tick, e.g. just below the wrap point.
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            ticks: Arc::new(AtomicU32::new(tick)),
        }
    }

    /// Advance the clock by `ticks`, wrapping like a hardware tick counter.
    pub fn advance(&self, ticks: Tick) {
        // fetch_add on atomics wraps on overflow.
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Set the absolute tick count.
    pub fn set(&self, tick: Tick) {
        self.ticks.store(tick, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        self.ticks.load(Ordering::Relaxed)
    }

    fn sleep(&self, ticks: Tick) {
        self.advance(ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(250);
        assert_eq!(b.now(), 250);
        b.sleep(50);
        assert_eq!(a.now(), 300);
    }

    #[test]
    fn ticks_since_survives_wrap() {
        let clock = ManualClock::starting_at(u32::MAX - 9);
        let earlier = clock.now();
        clock.advance(30);
        assert_eq!(clock.now(), 20);
        assert_eq!(clock.ticks_since(earlier), 30);
    }

    #[test]
    fn tick_duration_is_one_millisecond() {
        assert_eq!(ticks_to_duration(TICKS_PER_SECOND), Duration::from_secs(1));
        assert_eq!(ticks_to_duration(TICKS_100MS), Duration::from_millis(100));
    }
}
