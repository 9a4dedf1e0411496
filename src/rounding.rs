//! Decimal rounding rules.
//!
//! The two pipelines round differently and the difference is visible in
//! the output, so both rules are kept:
//!
//! - [`round_half_even_decimal`] rounds the exact decimal expansion of the
//!   binary value, breaking exact ties to even. `0.145` is stored as
//!   `0.14499999999999999…` and becomes `0.14`; the exact tie `0.125`
//!   becomes `0.12`. Online fractions use this rule.
//! - [`round_half_even_scaled`] multiplies by `10^digits`, rounds ties to
//!   even and divides back. The multiplication itself can round, so results
//!   may differ from the decimal rule in the last place. Age statistics use
//!   this rule.

/// Round `value` to `digits` decimal places using its exact decimal expansion.
pub fn round_half_even_decimal(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // Display with a precision is exact and breaks ties to even.
    format!("{:.*}", digits as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Round `value` to `digits` decimal places by scaling.
pub fn round_half_even_scaled(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / scale
}
