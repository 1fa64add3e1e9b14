//! Impression processing: deduplication, counting and unique key tracking.
//!
//! An [`Impression`] records one evaluation decision. Impressions are passed to an
//! [`ImpressionsManager`], which decides according to its [`ImpressionsMode`] which of them are
//! stored, counted or tracked as unique keys, and forwards all of them to an optional
//! [`ImpressionListener`].
mod bloom;
mod counter;
mod listener;
mod lru;
mod manager;
mod observer;
mod strategies;
mod unique_keys;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{eval::Evaluation, Str};

pub use bloom::BloomFilter;
pub use counter::{CountPerFeature, Counter};
pub use listener::{ImpressionListener, ListenerError};
pub use lru::LruCache;
pub use manager::{ImpressionsManager, ProcessedImpressions};
pub use observer::ImpressionObserver;
pub use strategies::{
    DebugStrategy, ImpressionWithAttributes, NoneStrategy, OptimizedStrategy, ProcessStrategy,
    StrategyOutput,
};
pub use unique_keys::UniqueKeysTracker;

const HOUR_MILLIS: i64 = 3_600_000;

/// A record of one evaluation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impression {
    /// Key the flag was evaluated for.
    pub matching_key: Str,
    /// Flag name.
    pub feature: Str,
    /// Treatment served.
    pub treatment: Str,
    /// Why the treatment was served.
    pub label: Str,
    /// Change number of the flag definition.
    pub change_number: i64,
    /// Bucketing key, if different from the matching key.
    pub bucketing_key: Option<Str>,
    /// Evaluation time, in milliseconds since epoch.
    pub time: i64,
    /// Time the same impression was last seen, in milliseconds since epoch.
    pub previous_time: Option<i64>,
}

impl Impression {
    /// Build an impression for an evaluation of `feature` happening at `time`.
    pub fn from_evaluation(
        feature: impl Into<Str>,
        matching_key: impl Into<Str>,
        bucketing_key: Option<&str>,
        evaluation: &Evaluation,
        time: i64,
    ) -> Impression {
        Impression {
            matching_key: matching_key.into(),
            feature: feature.into(),
            treatment: evaluation.treatment.clone(),
            label: evaluation.label.clone(),
            change_number: evaluation.change_number,
            bucketing_key: bucketing_key.map(Str::from),
            time,
            previous_time: None,
        }
    }
}

/// How impressions are deduplicated and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum ImpressionsMode {
    /// Store an impression at most once per hour and count the rest.
    #[default]
    Optimized,
    /// Store every impression.
    Debug,
    /// Store nothing. Only counts and unique keys are kept.
    None,
}

/// Error returned when parsing an unknown [`ImpressionsMode`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown impressions mode: {0:?}")]
pub struct UnknownImpressionsMode(String);

impl FromStr for ImpressionsMode {
    type Err = UnknownImpressionsMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPTIMIZED" => Ok(ImpressionsMode::Optimized),
            "DEBUG" => Ok(ImpressionsMode::Debug),
            "NONE" => Ok(ImpressionsMode::None),
            _ => Err(UnknownImpressionsMode(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ImpressionsMode {
    type Error = UnknownImpressionsMode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for ImpressionsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ImpressionsMode::Optimized => "OPTIMIZED",
            ImpressionsMode::Debug => "DEBUG",
            ImpressionsMode::None => "NONE",
        })
    }
}

/// Start of the hour `time` falls in, in milliseconds since epoch.
pub fn truncate_hour(time: i64) -> i64 {
    time - time.rem_euclid(HOUR_MILLIS)
}

/// Current time, in milliseconds since epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use crate::{eval::Evaluation, impressions::ImpressionsMode};

    use super::{truncate_hour, Impression};

    #[test]
    fn truncates_to_hour() {
        assert_eq!(truncate_hour(1710085347123), 1710082800000);
        assert_eq!(truncate_hour(1710082800000), 1710082800000);
        assert_eq!(truncate_hour(0), 0);
    }

    #[test]
    fn parses_mode_case_insensitively() {
        assert_eq!("optimized".parse::<ImpressionsMode>().unwrap(), ImpressionsMode::Optimized);
        assert_eq!("Debug".parse::<ImpressionsMode>().unwrap(), ImpressionsMode::Debug);
        assert_eq!(
            serde_json::from_str::<ImpressionsMode>(r#""none""#).unwrap(),
            ImpressionsMode::None
        );
        assert!("verbose".parse::<ImpressionsMode>().is_err());
        assert_eq!(
            serde_json::to_string(&ImpressionsMode::Optimized).unwrap(),
            r#""OPTIMIZED""#
        );
    }

    #[test]
    fn serializes_impression() {
        let evaluation = Evaluation {
            treatment: "on".into(),
            label: "default rule".into(),
            change_number: 123,
            config: None,
        };
        let impression = Impression::from_evaluation("checkout", "user-1", None, &evaluation, 1000);

        assert_eq!(
            serde_json::to_value(&impression).unwrap(),
            serde_json::json!({
                "matchingKey": "user-1",
                "feature": "checkout",
                "treatment": "on",
                "label": "default rule",
                "changeNumber": 123,
                "bucketingKey": null,
                "time": 1000,
                "previousTime": null,
            })
        );
    }
}
