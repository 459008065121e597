use crate::constants::NUMERIC_SENTINELS;
use tracing::trace;

/// Converts a scraped amount such as `"1,234.5"` into a number.
///
/// Sentinels, blanks and anything that does not parse as a finite decimal
/// come back as `0.0`. This never fails.
pub fn coerce(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if NUMERIC_SENTINELS.contains(&trimmed) {
        return 0.0;
    }

    let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
    match digits.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            trace!(raw, "amount did not parse, using 0.0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(coerce("1,234"), 1234.0);
        assert_eq!(coerce("1,234,567.89"), 1_234_567.89);
        assert_eq!(coerce(" 862,700.4 "), 862_700.4);
    }

    #[test]
    fn sentinels_are_zero() {
        for raw in ["无数据", "--", "—", "0", ""] {
            assert_eq!(coerce(raw), 0.0, "sentinel {raw:?}");
        }
    }

    #[test]
    fn unparsable_falls_back_to_zero() {
        assert_eq!(coerce("abc"), 0.0);
        assert_eq!(coerce("12abc"), 0.0);
        assert_eq!(coerce(","), 0.0);
        assert_eq!(coerce("inf"), 0.0);
        assert_eq!(coerce("NaN"), 0.0);
    }

    #[test]
    fn keeps_sign_and_precision() {
        assert_eq!(coerce("-4,337.6"), -4337.6);
        assert_eq!(coerce("0.1"), 0.1);
        assert_eq!(coerce("0.0"), 0.0);
    }
}
