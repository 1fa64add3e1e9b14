//! Labels attached to evaluations and impressions, explaining why a treatment was chosen.

/// Treatment returned when no treatment could be computed.
pub const CONTROL: &str = "control";

/// The flag is killed and everybody gets the default treatment.
pub const KILLED: &str = "killed";

/// No condition matched.
pub const DEFAULT_RULE: &str = "default rule";

/// The flag is not known.
pub const SPLIT_NOT_FOUND: &str = "definition not found";

/// The key falls outside the flag's traffic allocation.
pub const NOT_IN_SPLIT: &str = "not in split";

/// Evaluation failed. Reserved for callers that turn an `Err` into an impression.
pub const EXCEPTION: &str = "exception";

/// The flag uses a matcher type this crate does not know.
pub const UNSUPPORTED_MATCHER_TYPE: &str = "targeting rule type unsupported by sdk";
