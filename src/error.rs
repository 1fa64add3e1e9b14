use std::sync::Arc;

use crate::Str;

/// Represents a result type for operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors.
///
/// Data errors (wrong attribute types, unparsable input) never show up here: matchers fail
/// closed instead. The variants below signal a wiring or configuration problem in the embedding
/// application.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A segment matcher was evaluated but no segment membership lookup was provided.
    #[error("segment membership lookup is required to evaluate segment {segment:?}")]
    SegmentMembershipMissing {
        /// Name of the segment the matcher refers to.
        segment: Str,
    },

    /// Flag definitions could not be parsed.
    #[error("error parsing flag definitions")]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    ConfigurationParse(#[source] Arc<serde_json::Error>),

    /// A constructor argument is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigurationParse(Arc::new(value))
    }
}
