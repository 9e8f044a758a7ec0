//! Outcome classification for the completion-prediction label, and
//! enrollment-size buckets used when reporting completion rates.

/// Statuses treated as a successful outcome. `ACTIVE_NOT_RECRUITING` counts:
/// enrollment has finished and the trial is in follow-up.
pub const SUCCESS_STATUSES: &[&str] = &["COMPLETED", "ACTIVE_NOT_RECRUITING"];

/// Statuses treated as a failed outcome.
pub const FAILURE_STATUSES: &[&str] = &["TERMINATED", "WITHDRAWN", "SUSPENDED"];

/// Whether a trial status resolves to a binary label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// Still running, unknown, or any status outside the two resolved sets.
    Unresolved,
}

impl Outcome {
    pub fn classify(status: &str) -> Self {
        if SUCCESS_STATUSES.contains(&status) {
            Self::Success
        } else if FAILURE_STATUSES.contains(&status) {
            Self::Failure
        } else {
            Self::Unresolved
        }
    }

    /// The `completed` label: 1 for success, 0 for failure, none if unresolved.
    pub fn label(self) -> Option<i64> {
        match self {
            Self::Success => Some(1),
            Self::Failure => Some(0),
            Self::Unresolved => None,
        }
    }
}

/// Enrollment-size bucket. Edges at 30, 100 and 300 are fixed; each bucket
/// includes its lower edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnrollmentBucket {
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl EnrollmentBucket {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::VeryLarge];

    /// Bucket for an enrollment count. Negative or non-finite counts have none.
    pub fn from_count(count: f64) -> Option<Self> {
        if !count.is_finite() || count < 0.0 {
            None
        } else if count < 30.0 {
            Some(Self::Small)
        } else if count < 100.0 {
            Some(Self::Medium)
        } else if count < 300.0 {
            Some(Self::Large)
        } else {
            Some(Self::VeryLarge)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "Small (<30)",
            Self::Medium => "Medium (30-100)",
            Self::Large => "Large (100-300)",
            Self::VeryLarge => "Very Large (300+)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(Outcome::classify("COMPLETED").label(), Some(1));
        assert_eq!(Outcome::classify("ACTIVE_NOT_RECRUITING").label(), Some(1));
        assert_eq!(Outcome::classify("TERMINATED").label(), Some(0));
        assert_eq!(Outcome::classify("WITHDRAWN").label(), Some(0));
        assert_eq!(Outcome::classify("SUSPENDED").label(), Some(0));
        assert_eq!(Outcome::classify("RECRUITING"), Outcome::Unresolved);
        assert_eq!(Outcome::classify("UNKNOWN"), Outcome::Unresolved);
        assert_eq!(Outcome::classify(""), Outcome::Unresolved);
        assert_eq!(Outcome::classify("completed"), Outcome::Unresolved);
    }

    #[test]
    fn buckets() {
        assert_eq!(EnrollmentBucket::from_count(0.0), Some(EnrollmentBucket::Small));
        assert_eq!(EnrollmentBucket::from_count(25.0), Some(EnrollmentBucket::Small));
        assert_eq!(EnrollmentBucket::from_count(30.0), Some(EnrollmentBucket::Medium));
        assert_eq!(EnrollmentBucket::from_count(99.0), Some(EnrollmentBucket::Medium));
        assert_eq!(EnrollmentBucket::from_count(100.0), Some(EnrollmentBucket::Large));
        assert_eq!(EnrollmentBucket::from_count(300.0), Some(EnrollmentBucket::VeryLarge));
        assert_eq!(EnrollmentBucket::from_count(50_000.0), Some(EnrollmentBucket::VeryLarge));
        assert_eq!(EnrollmentBucket::from_count(-1.0), None);
        assert_eq!(EnrollmentBucket::from_count(f64::NAN), None);
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(EnrollmentBucket::Small.label(), "Small (<30)");
        assert_eq!(EnrollmentBucket::VeryLarge.label(), "Very Large (300+)");
    }
}
