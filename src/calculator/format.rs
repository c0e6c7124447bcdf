//! Canonical string rendering of evaluation results.

use super::error::EvalError;

/// Magnitude from which results switch to scientific notation.
pub const SCIENTIFIC_THRESHOLD: f64 = 1e12;

/// Render a result.
///
/// Large magnitudes use `d.dddddde+XX`, everything else is fixed notation with
/// at most 12 fractional digits and no trailing zeros.
pub fn format_value(value: f64) -> Result<String, EvalError> {
    if value.is_infinite() {
        return Err(EvalError::Infinite);
    }
    if value.is_nan() {
        return Err(EvalError::NotANumber);
    }

    if value.abs() >= SCIENTIFIC_THRESHOLD {
        return Ok(format_scientific(value));
    }

    let fixed = format!("{:.12}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        return Ok("0".to_string());
    }
    Ok(trimmed.to_string())
}

/// `1.234560e+15` rather than Rust's `1.234560e15`.
fn format_scientific(value: f64) -> String {
    let raw = format!("{:.6e}", value);
    // `{:e}` always emits a mantissa, an `e`, then an optional `-` and digits.
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    let padding = if digits.len() < 2 { "0" } else { "" };
    format!("{mantissa}e{sign}{padding}{digits}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_drop_fraction() {
        assert_eq!(format_value(10.0).unwrap(), "10");
        assert_eq!(format_value(-42.0).unwrap(), "-42");
        assert_eq!(format_value(0.0).unwrap(), "0");
        assert_eq!(format_value(100.0).unwrap(), "100");
    }

    #[test]
    fn test_fractions_trimmed() {
        assert_eq!(format_value(0.5).unwrap(), "0.5");
        assert_eq!(format_value(0.1 + 0.2).unwrap(), "0.3");
        assert_eq!(format_value(1.0 / 3.0).unwrap(), "0.333333333333");
        assert_eq!(format_value(2.0 / 3.0).unwrap(), "0.666666666667");
    }

    #[test]
    fn test_tiny_values_collapse_to_zero() {
        assert_eq!(format_value(1e-13).unwrap(), "0");
    }

    #[test]
    fn test_negative_zero_keeps_its_sign() {
        assert_eq!(format_value(-1e-13).unwrap(), "-0");
        assert_eq!(format_value(-0.0).unwrap(), "-0");
        let reparsed: f64 = "-0".parse().unwrap();
        assert_eq!(format_value(reparsed).unwrap(), "-0");
    }

    #[test]
    fn test_scientific_above_threshold() {
        assert_eq!(format_value(2e13).unwrap(), "2.000000e+13");
        assert_eq!(format_value(1.23456e15).unwrap(), "1.234560e+15");
        assert_eq!(format_value(-1.5e15).unwrap(), "-1.500000e+15");
        assert_eq!(format_value(1e100).unwrap(), "1.000000e+100");
        assert_eq!(format_value(1e12).unwrap(), "1.000000e+12");
        assert_eq!(format_value(999_999_999_999.0).unwrap(), "999999999999");
        assert_eq!(format_value(-1e300).unwrap(), "-1.000000e+300");
    }

    #[test]
    fn test_scientific_exponent_padding() {
        assert_eq!(format_scientific(1.5e5), "1.500000e+05");
        assert_eq!(format_scientific(2.5e-7), "2.500000e-07");
        assert_eq!(format_scientific(1e-100), "1.000000e-100");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(format_value(f64::INFINITY), Err(EvalError::Infinite));
        assert_eq!(format_value(f64::NEG_INFINITY), Err(EvalError::Infinite));
        assert_eq!(format_value(f64::NAN), Err(EvalError::NotANumber));
    }

    #[test]
    fn test_formatting_is_idempotent() {
        for value in [0.5, 1.0 / 3.0, -2.75, 123456.789, 2e13, 1.23456e15, -7.0e20] {
            let once = format_value(value).unwrap();
            let reparsed: f64 = once.parse().unwrap();
            assert_eq!(format_value(reparsed).unwrap(), once, "value: {value}");
        }
    }
}
