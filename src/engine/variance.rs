// ==========================================
// IPO Validation - Variance Rules
// ==========================================
// Pure functions of (actual_usage, ipo_usage)
// ==========================================

use crate::domain::types::VarianceCategory;

/// actual = 0, ipo != 0
pub const UNBOUNDED_VARIANCE_PERCENT: f64 = 999.99;

/// actual != 0, ipo = 0
pub const MISSING_PLAN_VARIANCE_PERCENT: f64 = -999.99;

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// ipo - actual
pub fn variance(actual_usage: f64, ipo_usage: f64) -> f64 {
    ipo_usage - actual_usage
}

/// Percent variance relative to actual usage. Never divides by zero.
pub fn variance_percent(actual_usage: f64, ipo_usage: f64) -> f64 {
    match (actual_usage == 0.0, ipo_usage == 0.0) {
        (true, true) => 0.0,
        (true, false) => UNBOUNDED_VARIANCE_PERCENT,
        (false, true) => MISSING_PLAN_VARIANCE_PERCENT,
        (false, false) => round2((ipo_usage - actual_usage).abs() * 100.0 / actual_usage.abs()),
    }
}

/// First matching rule wins. `Error` only for inputs no rule covers (NaN).
pub fn categorize(actual_usage: f64, ipo_usage: f64) -> VarianceCategory {
    if actual_usage == ipo_usage {
        VarianceCategory::PerfectMatch
    } else if actual_usage == 0.0 && ipo_usage != 0.0 {
        VarianceCategory::MissingFromUsage
    } else if actual_usage != 0.0 && ipo_usage == 0.0 {
        VarianceCategory::MissingFromIpo
    } else if ipo_usage > actual_usage {
        VarianceCategory::MoreInIpo
    } else if actual_usage > ipo_usage {
        VarianceCategory::MoreInUsage
    } else {
        VarianceCategory::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_percent_edge_cases() {
        assert_eq!(variance_percent(0.0, 0.0), 0.0);
        assert_eq!(variance_percent(0.0, 7.0), 999.99);
        assert_eq!(variance_percent(5.0, 0.0), -999.99);
        assert_eq!(variance_percent(100.0, 150.0), 50.0);
        assert_eq!(variance_percent(100.0, 90.0), 10.0);
    }

    #[test]
    fn test_variance_percent_rounds_to_two_places() {
        assert_eq!(variance_percent(3.0, 4.0), 33.33);
        assert_eq!(variance_percent(3.0, 5.0), 66.67);
    }

    #[test]
    fn test_variance_sign() {
        assert_eq!(variance(5.0, 0.0), -5.0);
        assert_eq!(variance(2.0, 7.5), 5.5);
    }

    #[test]
    fn test_categorize_precedence() {
        assert_eq!(categorize(0.0, 0.0), VarianceCategory::PerfectMatch);
        assert_eq!(categorize(4.0, 4.0), VarianceCategory::PerfectMatch);
        assert_eq!(categorize(0.0, 3.0), VarianceCategory::MissingFromUsage);
        assert_eq!(categorize(5.0, 0.0), VarianceCategory::MissingFromIpo);
        assert_eq!(categorize(2.0, 3.0), VarianceCategory::MoreInIpo);
        assert_eq!(categorize(3.0, 2.0), VarianceCategory::MoreInUsage);
    }

    #[test]
    fn test_categorize_total_on_finite_grid() {
        let values = [-2.5, -1.0, 0.0, 0.5, 1.0, 3.0, 1e9];
        for actual in values {
            for ipo in values {
                let category = categorize(actual, ipo);
                assert_ne!(category, VarianceCategory::Error, "({}, {})", actual, ipo);
                assert!(VarianceCategory::ALL.contains(&category));
                // pure: same inputs, same answer
                assert_eq!(category, categorize(actual, ipo));
            }
        }
    }

    #[test]
    fn test_categorize_nan_is_error() {
        assert_eq!(categorize(f64::NAN, 1.0), VarianceCategory::Error);
    }
}
