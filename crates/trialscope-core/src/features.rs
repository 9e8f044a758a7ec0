//! Scalar feature rules applied per row by the derived-feature stage.
//!
//! Status, allocation, masking and sponsor comparisons are exact and
//! case-sensitive; the registry emits upper-case enum values.

/// Statuses counted as "closed" for the `is_completed` feature.
pub const CLOSED_STATUSES: &[&str] = &["COMPLETED", "TERMINATED", "WITHDRAWN"];

/// Statuses counted as recruiting for the `is_recruiting` feature.
pub const RECRUITING_STATUSES: &[&str] =
    &["RECRUITING", "NOT_YET_RECRUITING", "ENROLLING_BY_INVITATION"];

/// Masking levels counted as blinded.
pub const BLINDED_MASKING: &[&str] = &["DOUBLE", "TRIPLE", "QUADRUPLE"];

pub fn is_completed(status: &str) -> bool {
    CLOSED_STATUSES.contains(&status)
}

pub fn is_recruiting(status: &str) -> bool {
    RECRUITING_STATUSES.contains(&status)
}

/// Map a phase to its numeric position. `NA` and unknown phases have none.
pub fn phase_numeric(phase: &str) -> Option<f64> {
    match phase {
        "EARLY_PHASE1" => Some(0.5),
        "PHASE1" => Some(1.0),
        "PHASE2" => Some(2.0),
        "PHASE3" => Some(3.0),
        "PHASE4" => Some(4.0),
        _ => None,
    }
}

pub fn is_randomized(allocation: &str) -> bool {
    allocation == "RANDOMIZED"
}

pub fn is_blinded(masking: &str) -> bool {
    BLINDED_MASKING.contains(&masking)
}

pub fn is_industry_sponsored(sponsor_class: &str) -> bool {
    sponsor_class == "INDUSTRY"
}

/// Number of entries in a joined intervention-types string.
///
/// An empty string means no interventions, not one empty intervention.
pub fn intervention_count(intervention_types: &str) -> i64 {
    if intervention_types.is_empty() {
        0
    } else {
        intervention_types.split(',').count() as i64
    }
}

/// Whole days between two Arrow `Date32` values; missing if either is.
pub fn duration_days(start: Option<i32>, completion: Option<i32>) -> Option<i64> {
    Some(i64::from(completion?) - i64::from(start?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{date_to_days, parse_date};

    #[test]
    fn phase_mapping() {
        assert_eq!(phase_numeric("EARLY_PHASE1"), Some(0.5));
        assert_eq!(phase_numeric("PHASE1"), Some(1.0));
        assert_eq!(phase_numeric("PHASE2"), Some(2.0));
        assert_eq!(phase_numeric("PHASE4"), Some(4.0));
        assert_eq!(phase_numeric("NA"), None);
        assert_eq!(phase_numeric("BOGUS"), None);
        assert_eq!(phase_numeric("phase2"), None);
        assert_eq!(phase_numeric(""), None);
    }

    #[test]
    fn intervention_counting() {
        assert_eq!(intervention_count(""), 0);
        assert_eq!(intervention_count("DRUG"), 1);
        assert_eq!(intervention_count("DRUG, DRUG"), 2);
        assert_eq!(intervention_count("DRUG, BIOLOGICAL, PROCEDURE"), 3);
    }

    #[test]
    fn status_flags() {
        assert!(is_completed("COMPLETED"));
        assert!(is_completed("WITHDRAWN"));
        assert!(!is_completed("ACTIVE_NOT_RECRUITING"));
        assert!(is_recruiting("ENROLLING_BY_INVITATION"));
        assert!(!is_recruiting("COMPLETED"));
    }

    #[test]
    fn design_flags_are_exact() {
        assert!(is_randomized("RANDOMIZED"));
        assert!(!is_randomized("randomized"));
        assert!(!is_randomized("NON_RANDOMIZED"));
        assert!(is_blinded("QUADRUPLE"));
        assert!(!is_blinded("SINGLE"));
        assert!(!is_blinded("NONE"));
        assert!(is_industry_sponsored("INDUSTRY"));
        assert!(!is_industry_sponsored("NIH"));
    }

    #[test]
    fn durations() {
        let start = parse_date("2020-01-01").map(date_to_days);
        let end = parse_date("2020-01-31").map(date_to_days);
        assert_eq!(duration_days(start, end), Some(30));
        assert_eq!(duration_days(None, end), None);
        assert_eq!(duration_days(start, None), None);
        assert_eq!(duration_days(end, start), Some(-30));
    }
}
