//! Rounding rules shared by the rise-time and LUT2 channel quantizers.

/// Rounds to the nearest integer, ties going up.
///
/// Uses the fractional part against `floor`, so `10.5 -> 11`,
/// `10.4999 -> 10` and `-2.5 -> -2`. NaN maps to 0.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    if value - floor < 0.5 {
        floor as i64
    } else {
        value.ceil() as i64
    }
}

/// Result of clamping a quantized value into a table axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamp {
    /// Value was inside the axis.
    InRange,
    /// Value was below 0 and was raised to 0.
    Low,
    /// Value was above the last index and was lowered to it.
    High,
}

/// Clamps `value` into `[0, max]`, reporting which edge (if any) was hit.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_index(value: i64, max: usize) -> (usize, Clamp) {
    if value < 0 {
        (0, Clamp::Low)
    } else if value as u64 > max as u64 {
        (max, Clamp::High)
    } else {
        (value as usize, Clamp::InRange)
    }
}
