use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in the map's projection space (not longitude/latitude).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Linear interpolation toward `other`; `t` is not clamped.
    pub fn lerp(self, other: Coordinate, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Renders as `x,y`, matching how a browser stringifies a two-element number array.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", format_number(self.x), format_number(self.y))
    }
}

/// Format an `f64` the way a browser prints a number: integral values carry no
/// fractional part, `-0` prints as `0`, non-finite values use their JS names,
/// and magnitudes below `1e-6` or from `1e21` up switch to exponent form.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        return js_exponent(value);
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    format!("{value}")
}

/// `1.5e-7` stays as is, `1e21` becomes `1e+21`.
fn js_exponent(value: f64) -> String {
    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_coordinates_print_without_fraction() {
        assert_eq!(Coordinate::new(10.0, 20.0).to_string(), "10,20");
    }

    #[test]
    fn fractional_and_negative_values_keep_shortest_form() {
        assert_eq!(Coordinate::new(0.5, -1234.25).to_string(), "0.5,-1234.25");
    }

    #[test]
    fn negative_zero_and_non_finite_values() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn tiny_and_huge_magnitudes_use_exponent_form() {
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(-2e-9), "-2e-9");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-3.25e22), "-3.25e+22");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(Coordinate::new(1.5e-7, 0.5).to_string(), "1.5e-7,0.5");
    }

    #[test]
    fn lerp_reaches_both_ends() {
        let a = Coordinate::new(0.0, 10.0);
        let b = Coordinate::new(4.0, -10.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Coordinate::new(2.0, 0.0));
    }
}
