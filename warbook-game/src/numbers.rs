//! Numeric conversion helpers centralizing safe numeric casts.
//!
//! Every float-to-integer conversion in the engine goes through here so the
//! rounding rule is identical on every platform: round half away from zero,
//! then floor at zero.

use num_traits::cast::cast;

/// Round a f64 half away from zero and clamp it to the `u32` range.
///
/// Negative and NaN values become 0.
#[must_use]
pub fn round_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    let rounded = value.round().min(max);
    cast::<f64, u32>(rounded).unwrap_or(u32::MAX)
}

/// Round a f64 half away from zero and clamp it to the `u64` range.
///
/// Used for lottery weights, which may exceed `u32` for very large armies.
#[must_use]
pub fn round_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let rounded = value.round().min(max);
    cast::<f64, u64>(rounded).unwrap_or(u64::MAX)
}

/// Clamp a signed commitment to zero and widen it to `u32`.
#[must_use]
pub fn non_negative(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
