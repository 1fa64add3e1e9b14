//! Flag evaluation.
mod context;
mod evaluator;

use serde::Serialize;

use crate::{labels, models::FeatureFlag, Str};

pub use context::EvaluationContext;
pub use evaluator::{Evaluator, EvaluatorConfig};

/// Result of evaluating a flag for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Treatment served.
    pub treatment: Str,
    /// Why the treatment was chosen. See [`labels`](crate::labels).
    pub label: Str,
    /// Change number of the flag definition, or `-1` if the flag was not found.
    pub change_number: i64,
    /// Dynamic configuration attached to the treatment.
    pub config: Option<Str>,
}

impl Evaluation {
    pub(crate) fn new(flag: &FeatureFlag, treatment: Str, label: impl Into<Str>) -> Evaluation {
        Evaluation {
            config: flag.get_configurations_for(&treatment).cloned(),
            treatment,
            label: label.into(),
            change_number: flag.change_number,
        }
    }

    pub(crate) fn not_found() -> Evaluation {
        Evaluation {
            treatment: labels::CONTROL.into(),
            label: labels::SPLIT_NOT_FOUND.into(),
            change_number: -1,
            config: None,
        }
    }
}

/// Segment membership lookup used by `IN_SEGMENT` matchers.
///
/// Segment storage and synchronization live outside this crate. Any `Fn(&str, &str) -> bool`
/// taking `(segment, key)` can be used.
///
/// ```
/// # use std::collections::HashSet;
/// # use split_core::SegmentMembership;
/// let employees = HashSet::from(["alice", "bob"]);
/// let segments = move |segment: &str, key: &str| segment == "employees" && employees.contains(key);
/// assert!(segments.is_in_segment("employees", "alice"));
/// assert!(!segments.is_in_segment("employees", "carol"));
/// ```
pub trait SegmentMembership {
    /// Return `true` if `key` belongs to `segment`.
    fn is_in_segment(&self, segment: &str, key: &str) -> bool;
}

impl<T: Fn(&str, &str) -> bool> SegmentMembership for T {
    fn is_in_segment(&self, segment: &str, key: &str) -> bool {
        self(segment, key)
    }
}
