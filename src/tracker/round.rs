/// Fraction at or above which a value rounds up.
pub const HALF: f64 = 0.5;

/// Decimal places kept for every reported percentage.
pub const PERCENT_PLACES: i32 = 2;

/// Round `value` to `places` decimals, rounding up when the fractional part
/// of the scaled value is at least `threshold`.
///
/// The ceil/floor choice is applied to the signed value as-is, so negative
/// inputs are not mirrored around zero: any negative fraction floors, so
/// `-0.001` at two places becomes `-0.01`. Callers that derive values from counter deltas
/// clamp those deltas to zero first.
pub fn round_half_up(value: f64, threshold: f64, places: i32) -> f64 {
    let pow = 10f64.powi(places);
    let scaled = value * pow;
    let fraction = scaled.fract();
    let rounded = if fraction >= threshold {
        scaled.ceil()
    } else {
        scaled.floor()
    };
    rounded / pow
}

/// Percentage rounding used by all trackers.
pub fn percent(value: f64) -> f64 {
    round_half_up(value, HALF, PERCENT_PLACES)
}
