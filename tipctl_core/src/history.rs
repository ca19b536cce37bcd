//! Fixed-window rolling history with an O(1) running sum.
//!
//! Samples are stored as `i16` (callers' values saturate on insert) and the
//! sum is kept in `i32`, which cannot overflow for `N <= 65_536`.
//! `average()` truncates toward zero, like integer division in the firmware
//! this controller replaces; near zero a window of mixed-sign errors may
//! therefore average to 0 where a floor division would give -1.

use crate::util::saturate_i16;

/// Samples in the control window: one second at the default 8 Hz cycle rate.
pub const HISTORY_LEN: usize = 8;

/// Rolling history of temperature errors (°C) feeding the integral term.
pub type ErrorHistory = RollingHistory<HISTORY_LEN>;

#[derive(Debug, Clone)]
pub struct RollingHistory<const N: usize> {
    buf: [i16; N],
    sum: i32,
    // Next slot to overwrite (the oldest sample).
    loc: usize,
}

impl<const N: usize> Default for RollingHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RollingHistory<N> {
    const VALID_LEN: () = assert!(N > 0 && N <= 65_536, "history length out of range");

    pub const fn new() -> Self {
        let () = Self::VALID_LEN;
        Self {
            buf: [0; N],
            sum: 0,
            loc: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Replace the oldest sample with `sample` (saturated to `i16`).
    #[inline]
    pub fn update(&mut self, sample: i32) {
        let v = saturate_i16(i64::from(sample));
        self.sum -= i32::from(self.buf[self.loc]);
        self.sum += i32::from(v);
        self.buf[self.loc] = v;
        self.loc = (self.loc + 1) % N;
    }

    /// `sum / N`, truncated toward zero.
    #[inline]
    pub fn average(&self) -> i32 {
        self.sum / N as i32
    }

    pub fn sum(&self) -> i32 {
        self.sum
    }

    /// Raw buffer in storage order (not chronological).
    pub fn samples(&self) -> &[i16; N] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let h = ErrorHistory::new();
        assert_eq!(h.sum(), 0);
        assert_eq!(h.average(), 0);
        assert!(h.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn evicts_oldest_sample() {
        let mut h = RollingHistory::<3>::new();
        h.update(10);
        h.update(20);
        h.update(30);
        assert_eq!(h.sum(), 60);
        h.update(40);
        // 10 was evicted
        assert_eq!(h.sum(), 90);
        assert_eq!(h.average(), 30);
    }

    #[test]
    fn average_truncates_toward_zero() {
        let mut h = RollingHistory::<4>::new();
        h.update(-3);
        assert_eq!(h.average(), 0);
        h.update(-3);
        // -6 / 4 = -1.5 -> -1
        assert_eq!(h.average(), -1);
        let mut p = RollingHistory::<4>::new();
        p.update(7);
        assert_eq!(p.average(), 1);
    }

    #[test]
    fn inserts_saturate_to_i16() {
        let mut h = RollingHistory::<2>::new();
        h.update(100_000);
        h.update(-100_000);
        assert_eq!(h.samples(), &[i16::MAX, i16::MIN]);
        assert_eq!(h.sum(), -1);
    }

    #[test]
    fn full_scale_window_does_not_overflow() {
        let mut h = RollingHistory::<65_536>::new();
        for _ in 0..65_536 {
            h.update(i32::from(i16::MAX));
        }
        assert_eq!(h.average(), i32::from(i16::MAX));
    }
}
