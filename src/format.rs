use crate::error::{FaultError, Result};

/// Format model outputs as integer strings of one common width.
///
/// Each value is truncated toward zero, then zero-filled to the length of
/// the longest formatted value. A leading minus sign stays in front of the
/// padding (`-5` at width 3 is `-05`).
pub fn format_predictions(values: &[f64]) -> Result<Vec<String>> {
    let digits = values
        .iter()
        .enumerate()
        .map(|(index, &value)| integer_text(value).ok_or(FaultError::NonFinitePrediction { index, value }))
        .collect::<Result<Vec<_>>>()?;

    let width = digits.iter().map(String::len).max().unwrap_or(0);
    Ok(digits.iter().map(|s| zero_fill(s, width)).collect())
}

fn integer_text(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    // -0.5 truncates to -0.0, which should print as "0".
    let truncated = if truncated == 0.0 { 0.0 } else { truncated };
    Some(format!("{truncated:.0}"))
}

fn zero_fill(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(s.len());
    match s.strip_prefix('-') {
        Some(rest) => format!("-{}{rest}", "0".repeat(pad)),
        None => format!("{}{s}", "0".repeat(pad)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_longest_value() {
        assert_eq!(
            format_predictions(&[1.0, 23.0, 456.0]).unwrap(),
            vec!["001", "023", "456"]
        );
    }

    #[test]
    fn truncates_fractions() {
        assert_eq!(
            format_predictions(&[10.9, 1.2, -0.5]).unwrap(),
            vec!["10", "01", "00"]
        );
    }

    #[test]
    fn sign_stays_in_front() {
        assert_eq!(
            format_predictions(&[-5.0, 110.0]).unwrap(),
            vec!["-05", "110"]
        );
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(format_predictions(&[]).unwrap().is_empty());
    }

    #[test]
    fn nan_is_rejected() {
        let err = format_predictions(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, FaultError::NonFinitePrediction { index: 1, .. }));
    }
}
