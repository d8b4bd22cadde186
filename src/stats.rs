//! summary statistics and threshold classification.
//!
//! every function here treats an empty sequence as `0.0` rather than failing. callers that need
//! to tell "no data" apart from a real zero must check for emptiness first.

/// how concerning a reading is, relative to a pair of thresholds.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Normal,
    Warn,
    Critical,
}

/// the arithmetic mean of `values`, or `0.0` if there are none.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// the smallest of `values`, or `0.0` if there are none.
pub fn min(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().reduce(f64::min).unwrap_or(0.0)
}

/// the largest of `values`, or `0.0` if there are none.
pub fn max(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().reduce(f64::max).unwrap_or(0.0)
}

/// maps a value onto a [`Severity`] band.
///
/// both bounds are inclusive toward the higher severity, and `crit` wins over `warn`.
pub fn classify(value: f64, warn: f64, crit: f64) -> Severity {
    if value >= crit {
        Severity::Critical
    } else if value >= warn {
        Severity::Warn
    } else {
        Severity::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_zero() {
        const NONE: [f64; 0] = [];
        assert_eq!(mean(NONE), 0.0);
        assert_eq!(min(NONE), 0.0);
        assert_eq!(max(NONE), 0.0);
    }

    #[test]
    fn mean_of_one() {
        assert_eq!(mean([42.5]), 42.5);
    }

    #[test]
    fn mean_ignores_order() {
        let a = mean([50.0, 75.0, 95.0, 60.0]);
        let b = mean([95.0, 60.0, 50.0, 75.0]);
        assert_eq!(a, 70.0);
        assert_eq!(a, b);
    }

    #[test]
    fn min_and_max() {
        let values = [50.0, 75.0, 95.0, 60.0];
        assert_eq!(min(values), 50.0);
        assert_eq!(max(values), 95.0);
    }

    #[test]
    fn classify_boundaries() {
        const WARN: f64 = 70.0;
        const CRIT: f64 = 90.0;

        assert_eq!(classify(CRIT, WARN, CRIT), Severity::Critical);
        assert_eq!(classify(CRIT + 5.0, WARN, CRIT), Severity::Critical);
        assert_eq!(classify(WARN, WARN, CRIT), Severity::Warn);
        assert_eq!(classify(CRIT - f64::EPSILON * 100.0, WARN, CRIT), Severity::Warn);
        assert_eq!(classify(WARN - 0.001, WARN, CRIT), Severity::Normal);
        assert_eq!(classify(0.0, WARN, CRIT), Severity::Normal);
    }

    #[test]
    fn crit_wins_when_thresholds_coincide() {
        assert_eq!(classify(80.0, 80.0, 80.0), Severity::Critical);
    }
}
