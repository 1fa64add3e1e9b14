//! Flag definition wire format, as produced by the synchronization layer.
//!
//! These types mirror the JSON one-to-one and carry no behavior. They are compiled into
//! [`FeatureFlag`](crate::FeatureFlag) before evaluation.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::hash::HashAlgorithm;

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
///
/// This can be helpful to isolate errors in a subtree. e.g., if one matcher uses a type this
/// crate does not know about, the rest of the flags are still usable.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum TryParse<T> {
    /// Successfully parsed.
    Parsed(T),
    /// Parsing failed.
    ParseFailed(serde_json::Value),
}
impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct FeatureFlagWire {
    pub name: String,
    pub seed: i32,
    #[serde(default = "default_traffic_allocation")]
    pub traffic_allocation: i32,
    #[serde(default)]
    pub traffic_allocation_seed: i32,
    #[serde(default)]
    pub algo: HashAlgorithm,
    #[serde(default)]
    pub killed: bool,
    pub default_treatment: String,
    #[serde(default)]
    pub change_number: i64,
    #[serde(default)]
    pub configurations: Option<HashMap<String, String>>,
    #[serde(default)]
    pub conditions: Vec<ConditionWire>,
}

fn default_traffic_allocation() -> i32 {
    100
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ConditionWire {
    #[serde(default)]
    pub condition_type: ConditionTypeWire,
    #[serde(default)]
    pub label: String,
    pub matcher_group: MatcherGroupWire,
    #[serde(default)]
    pub partitions: Vec<PartitionWire>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum ConditionTypeWire {
    #[default]
    Whitelist,
    Rollout,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MatcherGroupWire {
    #[serde(default)]
    pub combiner: CombinerWire,
    /// Wrapped in `TryParse` so that a matcher type we don't support only disables its flag.
    pub matchers: Vec<TryParse<MatcherWire>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum CombinerWire {
    #[default]
    And,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct PartitionWire {
    pub treatment: String,
    pub size: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MatcherWire {
    pub matcher_type: MatcherTypeWire,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub key_selector: Option<KeySelectorWire>,
    #[serde(default)]
    pub user_defined_segment_matcher_data: Option<SegmentDataWire>,
    #[serde(default)]
    pub whitelist_matcher_data: Option<WhitelistDataWire>,
    #[serde(default)]
    pub unary_numeric_matcher_data: Option<UnaryNumericDataWire>,
    #[serde(default)]
    pub between_matcher_data: Option<BetweenDataWire>,
    #[serde(default)]
    pub between_string_matcher_data: Option<BetweenStringDataWire>,
    #[serde(default)]
    pub dependency_matcher_data: Option<DependencyDataWire>,
    #[serde(default)]
    pub boolean_matcher_data: Option<bool>,
    #[serde(default)]
    pub string_matcher_data: Option<String>,
}

/// Matcher types understood by this crate. Anything else fails to parse and the enclosing
/// flag is compiled as unsupported.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum MatcherTypeWire {
    AllKeys,
    InSegment,
    Whitelist,
    EqualTo,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    Between,
    EqualToSet,
    PartOfSet,
    ContainsAllOfSet,
    ContainsAnyOfSet,
    StartsWith,
    EndsWith,
    ContainsString,
    InSplitTreatment,
    EqualToBoolean,
    MatchesString,
    EqualToSemver,
    GreaterThanOrEqualToSemver,
    LessThanOrEqualToSemver,
    BetweenSemver,
    InListSemver,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct KeySelectorWire {
    #[serde(default)]
    pub traffic_type: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SegmentDataWire {
    pub segment_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct WhitelistDataWire {
    #[serde(default)]
    pub whitelist: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum DataTypeWire {
    Number,
    Datetime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct UnaryNumericDataWire {
    pub data_type: DataTypeWire,
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct BetweenDataWire {
    pub data_type: DataTypeWire,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct BetweenStringDataWire {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct DependencyDataWire {
    pub split: String,
    #[serde(default)]
    pub treatments: Vec<String>,
}
