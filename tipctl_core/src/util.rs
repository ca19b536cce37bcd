//! Small integer helpers shared by the control path.

use tipctl_traits::clock::{TICKS_PER_SECOND, Tick};

/// Ticks between control cycles at `hz`.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 tick.
#[inline]
pub fn period_ticks(hz: u32) -> Tick {
    (TICKS_PER_SECOND / hz.max(1)).max(1)
}

/// Saturate a wide value into the `i16` range.
#[inline]
pub fn saturate_i16(v: i64) -> i16 {
    v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// Whole watts to tenths of a watt.
#[inline]
pub fn watts_to_x10(watts: u32) -> i32 {
    i32::try_from(watts.saturating_mul(10)).unwrap_or(i32::MAX)
}
