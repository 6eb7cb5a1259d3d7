use crate::table::CellValue;

/// Convert a cell to `f64`, falling back to `default` when the cell is absent,
/// blank, or text that does not parse as a number. Never fails.
pub fn coerce(value: Option<&CellValue>, default: f64) -> f64 {
    match value {
        None | Some(CellValue::Empty) => default,
        Some(CellValue::Number(v)) => {
            if v.is_nan() {
                default
            } else {
                *v
            }
        }
        Some(CellValue::Text(raw)) => coerce_str(raw, default),
    }
}

pub fn coerce_str(raw: &str, default: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if !v.is_nan() => v,
        _ => default,
    }
}

/// Round to `digits` decimal places. Exact halves go to the even neighbour,
/// so 4.125 rounds to 4.12.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

/// Render a float the way the report templates expect: integral values keep a
/// trailing `.0`, everything else uses the shortest round-trip form.
pub fn display_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Render an entrant number; integral values print without a fraction.
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_float_keeps_trailing_zero() {
        assert_eq!(display_float(8.0), "8.0");
        assert_eq!(display_float(0.5), "0.5");
        assert_eq!(display_float(12.35), "12.35");
        assert_eq!(display_float(-3.0), "-3.0");
    }

    #[test]
    fn display_number_drops_fraction_for_integers() {
        assert_eq!(display_number(3.0), "3");
        assert_eq!(display_number(3.5), "3.5");
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(12.345_67, 2), 12.35);
        assert_eq!(round_to(0.0, 2), 0.0);
        assert_eq!(round_to(-1.004, 2), -1.0);
    }

    #[test]
    fn round_to_sends_exact_halves_to_even() {
        assert_eq!(round_to(4.125, 2), 4.12);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn blank_text_falls_back_to_default() {
        assert_eq!(coerce_str("", 4.0), 4.0);
        assert_eq!(coerce_str("   ", 4.0), 4.0);
        assert_eq!(coerce_str(" 3.5 ", 4.0), 3.5);
    }

    #[test]
    fn nan_text_falls_back_to_default() {
        assert_eq!(coerce_str("NaN", 0.0), 0.0);
        assert_eq!(coerce(Some(&CellValue::Number(f64::NAN)), 2.0), 2.0);
    }
}
