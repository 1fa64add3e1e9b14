//! Matcher grammar: single predicates evaluated against the matching key or one attribute.
//!
//! Matchers never fail on bad data. An input of the wrong type, a missing attribute or an
//! unparsable value is a non-match. The only errors are configuration errors raised by
//! matchers that need a collaborator (segment membership).
mod compile;
mod numeric;
mod semver;

use std::collections::HashSet;

use regex::Regex;

use crate::{eval::EvaluationContext, AttributeValue, Attributes, Result, Str};

pub use numeric::NumericDataType;
pub use semver::{InvalidSemver, Semver};

/// A single predicate of a condition.
///
/// Evaluates to `negate XOR match(input)`, where `input` is the matching key, or the configured
/// attribute if the matcher has an attribute selector.
#[derive(Debug, Clone)]
pub struct Matcher {
    kind: MatcherKind,
    negate: bool,
    attribute: Option<String>,
}

/// All matcher variants, each holding its own immutable configuration.
#[derive(Debug, Clone)]
pub enum MatcherKind {
    /// Any present input.
    AllKeys,
    /// Input is a member of the segment.
    InSegment {
        /// Segment name.
        segment: Str,
    },
    /// Input is one of the strings.
    Whitelist(HashSet<String>),
    /// Input starts with any of the strings.
    StartsWith(Box<[String]>),
    /// Input ends with any of the strings.
    EndsWith(Box<[String]>),
    /// Input contains any of the strings.
    ContainsString(Box<[String]>),
    /// Integer input equal to `value`.
    EqualTo {
        /// How input and value are interpreted.
        data_type: NumericDataType,
        /// Normalized value.
        value: i64,
    },
    /// Integer input greater than or equal to `value`.
    GreaterThanOrEqualTo {
        /// How input and value are interpreted.
        data_type: NumericDataType,
        /// Normalized value.
        value: i64,
    },
    /// Integer input less than or equal to `value`.
    LessThanOrEqualTo {
        /// How input and value are interpreted.
        data_type: NumericDataType,
        /// Normalized value.
        value: i64,
    },
    /// Integer input within `[start, end]`.
    Between {
        /// How input and bounds are interpreted.
        data_type: NumericDataType,
        /// Normalized lower bound, inclusive.
        start: i64,
        /// Normalized upper bound, inclusive.
        end: i64,
    },
    /// List input equal to the set.
    EqualToSet(HashSet<String>),
    /// Non-empty list input whose elements are all in the set.
    PartOfSet(HashSet<String>),
    /// List input containing every element of the (non-empty) set.
    ContainsAllOfSet(HashSet<String>),
    /// List input containing at least one element of the set.
    ContainsAnyOfSet(HashSet<String>),
    /// Boolean input (or `"true"`/`"false"`, any case) equal to the value.
    EqualToBoolean(bool),
    /// String input in which the regex finds a match. `None` if the pattern was invalid.
    MatchesString(Option<Regex>),
    /// Version input equal to the version, metadata included. `None` if the configured
    /// version was invalid.
    EqualToSemver(Option<Semver>),
    /// Version input greater than or equal to the version.
    GreaterThanOrEqualToSemver(Option<Semver>),
    /// Version input less than or equal to the version.
    LessThanOrEqualToSemver(Option<Semver>),
    /// Version input within `[start, end]`.
    BetweenSemver(Option<(Semver, Semver)>),
    /// Version input is one of the versions (normalized strings).
    InListSemver(HashSet<String>),
    /// Another flag evaluates to one of the treatments for the same key.
    Dependency {
        /// Name of the flag depended upon.
        flag: Str,
        /// Accepted treatments.
        treatments: HashSet<String>,
    },
}

/// Value a matcher is applied to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MatcherInput<'a> {
    Key(&'a str),
    Attribute(&'a AttributeValue),
}

impl<'a> MatcherInput<'a> {
    fn as_str(&self) -> Option<&'a str> {
        match *self {
            MatcherInput::Key(key) => Some(key),
            MatcherInput::Attribute(value) => value.as_str(),
        }
    }

    pub(crate) fn as_integer(&self) -> Option<i64> {
        match *self {
            MatcherInput::Key(key) => numeric::parse_integer(key),
            MatcherInput::Attribute(AttributeValue::Number(n)) if n.is_finite() => {
                Some(n.trunc() as i64)
            }
            MatcherInput::Attribute(AttributeValue::String(s)) => numeric::parse_integer(s),
            MatcherInput::Attribute(_) => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match *self {
            MatcherInput::Attribute(AttributeValue::Boolean(b)) => Some(*b),
            _ => {
                let s = self.as_str()?;
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    /// Lists of strings only. A list holding anything else is not a set of strings.
    fn as_string_set(&self) -> Option<HashSet<&'a str>> {
        match *self {
            MatcherInput::Attribute(AttributeValue::List(items)) => {
                items.iter().map(AttributeValue::as_str).collect()
            }
            _ => None,
        }
    }

    fn as_semver(&self) -> Option<Semver> {
        self.as_str()?.parse().ok()
    }
}

impl Matcher {
    /// Create a non-negated matcher applied to the matching key.
    pub fn new(kind: MatcherKind) -> Matcher {
        Matcher {
            kind,
            negate: false,
            attribute: None,
        }
    }

    /// Negate the result of the matcher.
    pub fn negated(mut self) -> Matcher {
        self.negate = !self.negate;
        self
    }

    /// Apply the matcher to `attribute` instead of the matching key.
    pub fn on_attribute(mut self, attribute: impl Into<String>) -> Matcher {
        self.attribute = Some(attribute.into());
        self
    }

    /// Matcher variant and its configuration.
    pub fn kind(&self) -> &MatcherKind {
        &self.kind
    }

    /// Evaluate the matcher for `key`.
    pub fn evaluate(
        &self,
        key: &str,
        attributes: &Attributes,
        ctx: &EvaluationContext,
    ) -> Result<bool> {
        let input = self.input(key, attributes);
        let matched = self.kind.matches(input, key, attributes, ctx)?;
        Ok(self.negate ^ matched)
    }

    fn input<'a>(&self, key: &'a str, attributes: &'a Attributes) -> Option<MatcherInput<'a>> {
        match &self.attribute {
            None => Some(MatcherInput::Key(key)),
            Some(attribute) => attributes
                .get(attribute)
                .filter(|value| !value.is_null())
                .map(MatcherInput::Attribute),
        }
    }
}

impl MatcherKind {
    fn matches(
        &self,
        input: Option<MatcherInput>,
        key: &str,
        attributes: &Attributes,
        ctx: &EvaluationContext,
    ) -> Result<bool> {
        // Dependencies evaluate the other flag for the matching key regardless of the input.
        if let MatcherKind::Dependency { flag, treatments } = self {
            let evaluation = ctx.evaluate_dependency(flag, key, attributes)?;
            return Ok(evaluation.is_some_and(|it| treatments.contains(&*it.treatment)));
        }

        let Some(input) = input else {
            return Ok(false);
        };

        let matched = match self {
            MatcherKind::AllKeys => true,

            MatcherKind::InSegment { segment } => match input.as_str() {
                Some(value) => ctx.is_in_segment(segment, value)?,
                None => false,
            },

            MatcherKind::Whitelist(whitelist) => input.as_str().is_some_and(|s| whitelist.contains(s)),
            MatcherKind::StartsWith(prefixes) => input
                .as_str()
                .is_some_and(|s| prefixes.iter().any(|prefix| s.starts_with(prefix.as_str()))),
            MatcherKind::EndsWith(suffixes) => input
                .as_str()
                .is_some_and(|s| suffixes.iter().any(|suffix| s.ends_with(suffix.as_str()))),
            MatcherKind::ContainsString(needles) => input
                .as_str()
                .is_some_and(|s| needles.iter().any(|needle| s.contains(needle.as_str()))),

            MatcherKind::EqualTo { data_type, value } => {
                data_type.coerce(&input).is_some_and(|it| it == *value)
            }
            MatcherKind::GreaterThanOrEqualTo { data_type, value } => {
                data_type.coerce(&input).is_some_and(|it| it >= *value)
            }
            MatcherKind::LessThanOrEqualTo { data_type, value } => {
                data_type.coerce(&input).is_some_and(|it| it <= *value)
            }
            MatcherKind::Between {
                data_type,
                start,
                end,
            } => data_type
                .coerce(&input)
                .is_some_and(|it| *start <= it && it <= *end),

            MatcherKind::EqualToSet(whitelist) => input.as_string_set().is_some_and(|set| {
                set.len() == whitelist.len() && set.iter().all(|it| whitelist.contains(*it))
            }),
            MatcherKind::PartOfSet(whitelist) => input.as_string_set().is_some_and(|set| {
                !set.is_empty() && set.iter().all(|it| whitelist.contains(*it))
            }),
            MatcherKind::ContainsAllOfSet(whitelist) => input.as_string_set().is_some_and(|set| {
                !whitelist.is_empty() && whitelist.iter().all(|it| set.contains(it.as_str()))
            }),
            MatcherKind::ContainsAnyOfSet(whitelist) => input
                .as_string_set()
                .is_some_and(|set| set.iter().any(|it| whitelist.contains(*it))),

            MatcherKind::EqualToBoolean(expected) => input.as_bool() == Some(*expected),

            MatcherKind::MatchesString(regex) => match (regex, input.as_str()) {
                (Some(regex), Some(s)) => regex.is_match(s),
                _ => false,
            },

            MatcherKind::EqualToSemver(version) => match (version, input.as_semver()) {
                (Some(version), Some(it)) => it.version() == version.version(),
                _ => false,
            },
            MatcherKind::GreaterThanOrEqualToSemver(version) => {
                match (version, input.as_semver()) {
                    (Some(version), Some(it)) => it.compare(version).is_ge(),
                    _ => false,
                }
            }
            MatcherKind::LessThanOrEqualToSemver(version) => match (version, input.as_semver()) {
                (Some(version), Some(it)) => it.compare(version).is_le(),
                _ => false,
            },
            MatcherKind::BetweenSemver(bounds) => match (bounds, input.as_semver()) {
                (Some((start, end)), Some(it)) => {
                    it.compare(start).is_ge() && it.compare(end).is_le()
                }
                _ => false,
            },
            MatcherKind::InListSemver(versions) => input
                .as_semver()
                .is_some_and(|it| versions.contains(it.version())),

            // Handled before the input is looked at.
            MatcherKind::Dependency { .. } => false,
        };

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use crate::{
        eval::{EvaluationContext, Evaluator, EvaluatorConfig, SegmentMembership},
        matchers::{Matcher, MatcherKind, NumericDataType, Semver},
        AttributeValue, Attributes, ConfigurationStore, Error,
    };

    fn evaluator() -> Evaluator {
        Evaluator::new(EvaluatorConfig {
            configuration_store: Arc::new(ConfigurationStore::new()),
            segment_membership: None,
        })
    }

    fn employees(segment: &str, key: &str) -> bool {
        segment == "employees" && (key == "alice" || key == "bob")
    }

    fn eval_with(
        matcher: &Matcher,
        key: &str,
        attributes: &Attributes,
        segments: Option<&dyn SegmentMembership>,
    ) -> crate::Result<bool> {
        let evaluator = evaluator();
        let ctx = EvaluationContext::new(&evaluator, None, segments, key);
        matcher.evaluate(key, attributes, &ctx)
    }

    fn eval(matcher: &Matcher, key: &str, attributes: &Attributes) -> bool {
        eval_with(matcher, key, attributes, None).unwrap()
    }

    fn attrs<const N: usize>(entries: [(&str, AttributeValue); N]) -> Attributes {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|it| it.to_string()).collect()
    }

    #[test]
    fn all_keys_and_negation() {
        let matcher = Matcher::new(MatcherKind::AllKeys);
        assert!(eval(&matcher, "anyone", &Attributes::new()));
        assert!(!eval(&matcher.negated(), "anyone", &Attributes::new()));
    }

    #[test]
    fn missing_or_null_attribute_does_not_match() {
        let matcher = Matcher::new(MatcherKind::AllKeys).on_attribute("plan");
        assert!(!eval(&matcher, "user", &Attributes::new()));
        assert!(!eval(&matcher, "user", &attrs([("plan", AttributeValue::Null)])));
        assert!(eval(&matcher, "user", &attrs([("plan", "pro".into())])));

        // Negation is applied after the raw match.
        let matcher = matcher.negated();
        assert!(eval(&matcher, "user", &Attributes::new()));
    }

    #[test]
    fn segment_membership() {
        let matcher = Matcher::new(MatcherKind::InSegment {
            segment: "employees".into(),
        });
        let segments: &dyn SegmentMembership = &employees;
        assert!(eval_with(&matcher, "alice", &Attributes::new(), Some(segments)).unwrap());
        assert!(!eval_with(&matcher, "carol", &Attributes::new(), Some(segments)).unwrap());
    }

    #[test]
    fn segment_membership_missing_is_an_error() {
        let matcher = Matcher::new(MatcherKind::InSegment {
            segment: "employees".into(),
        });
        let result = eval_with(&matcher, "alice", &Attributes::new(), None);
        assert!(matches!(
            result,
            Err(Error::SegmentMembershipMissing { segment }) if segment == "employees"
        ));
    }

    #[test]
    fn string_matchers() {
        let whitelist = Matcher::new(MatcherKind::Whitelist(
            strings(&["alice", "bob"]).into_iter().collect(),
        ));
        assert!(eval(&whitelist, "alice", &Attributes::new()));
        assert!(!eval(&whitelist, "carol", &Attributes::new()));

        let starts_with = Matcher::new(MatcherKind::StartsWith(strings(&["user-", "acct-"]).into()))
            .on_attribute("id");
        assert!(eval(&starts_with, "k", &attrs([("id", "acct-42".into())])));
        assert!(!eval(&starts_with, "k", &attrs([("id", "team-42".into())])));
        // Non-string inputs fail closed.
        assert!(!eval(&starts_with, "k", &attrs([("id", 42_i64.into())])));

        let ends_with = Matcher::new(MatcherKind::EndsWith(strings(&["@split.io"]).into()));
        assert!(eval(&ends_with, "dev@split.io", &Attributes::new()));
        assert!(!eval(&ends_with, "dev@example.com", &Attributes::new()));

        let contains = Matcher::new(MatcherKind::ContainsString(strings(&["beta"]).into()));
        assert!(eval(&contains, "android-beta-7", &Attributes::new()));
        assert!(!eval(&contains, "android-7", &Attributes::new()));
    }

    #[test]
    fn numeric_matchers() {
        let between = Matcher::new(MatcherKind::Between {
            data_type: NumericDataType::Number,
            start: 18,
            end: 65,
        })
        .on_attribute("age");
        assert!(eval(&between, "k", &attrs([("age", 18_i64.into())])));
        assert!(eval(&between, "k", &attrs([("age", AttributeValue::Number(65.9))])));
        assert!(eval(&between, "k", &attrs([("age", "40".into())])));
        assert!(!eval(&between, "k", &attrs([("age", 66_i64.into())])));
        assert!(!eval(&between, "k", &attrs([("age", true.into())])));
        assert!(!eval(&between, "k", &attrs([("age", "forty".into())])));

        let gte = Matcher::new(MatcherKind::GreaterThanOrEqualTo {
            data_type: NumericDataType::Number,
            value: 10,
        });
        assert!(eval(&gte, "10", &Attributes::new()));
        assert!(!eval(&gte, "9", &Attributes::new()));

        let lte = Matcher::new(MatcherKind::LessThanOrEqualTo {
            data_type: NumericDataType::Number,
            value: -5,
        })
        .on_attribute("balance");
        assert!(eval(&lte, "k", &attrs([("balance", (-5_i64).into())])));
        assert!(!eval(&lte, "k", &attrs([("balance", 0_i64.into())])));
    }

    #[test]
    fn datetime_matchers_normalize_input() {
        // 2024-03-10T15:42:27.123Z
        let timestamp = 1710085347123_i64;

        let same_day = Matcher::new(MatcherKind::EqualTo {
            data_type: NumericDataType::DateTimeZeroTime,
            value: NumericDataType::DateTimeZeroTime.normalize(timestamp),
        })
        .on_attribute("signup");
        assert!(eval(&same_day, "k", &attrs([("signup", (timestamp - 15 * 3_600_000).into())])));
        assert!(!eval(&same_day, "k", &attrs([("signup", (timestamp + 9 * 3_600_000).into())])));

        let since = Matcher::new(MatcherKind::GreaterThanOrEqualTo {
            data_type: NumericDataType::DateTimeZeroSecond,
            value: NumericDataType::DateTimeZeroSecond.normalize(timestamp),
        })
        .on_attribute("signup");
        // Earlier within the same minute still counts.
        assert!(eval(&since, "k", &attrs([("signup", (timestamp - 20_000).into())])));
        assert!(!eval(&since, "k", &attrs([("signup", (timestamp - 60_000).into())])));
    }

    #[test]
    fn set_matchers() {
        let set = |values: &[&str]| strings(values).into_iter().collect();
        let list = |values: &[&str]| AttributeValue::from(values.to_vec());

        let equal = Matcher::new(MatcherKind::EqualToSet(set(&["a", "b"]))).on_attribute("tags");
        assert!(eval(&equal, "k", &attrs([("tags", list(&["b", "a"]))])));
        assert!(!eval(&equal, "k", &attrs([("tags", list(&["a"]))])));

        let part_of = Matcher::new(MatcherKind::PartOfSet(set(&["a", "b", "c"]))).on_attribute("tags");
        assert!(eval(&part_of, "k", &attrs([("tags", list(&["a", "c"]))])));
        assert!(!eval(&part_of, "k", &attrs([("tags", list(&["a", "d"]))])));
        assert!(!eval(&part_of, "k", &attrs([("tags", list(&[]))])));

        let contains_all =
            Matcher::new(MatcherKind::ContainsAllOfSet(set(&["a", "b"]))).on_attribute("tags");
        assert!(eval(&contains_all, "k", &attrs([("tags", list(&["a", "b", "c"]))])));
        assert!(!eval(&contains_all, "k", &attrs([("tags", list(&["a", "c"]))])));
        let contains_nothing =
            Matcher::new(MatcherKind::ContainsAllOfSet(set(&[]))).on_attribute("tags");
        assert!(!eval(&contains_nothing, "k", &attrs([("tags", list(&["a"]))])));

        let contains_any =
            Matcher::new(MatcherKind::ContainsAnyOfSet(set(&["a", "b"]))).on_attribute("tags");
        assert!(eval(&contains_any, "k", &attrs([("tags", list(&["x", "b"]))])));
        assert!(!eval(&contains_any, "k", &attrs([("tags", list(&["x"]))])));

        // Anything but a list of strings fails closed.
        assert!(!eval(&contains_any, "k", &attrs([("tags", "a".into())])));
        let mixed = AttributeValue::List(vec!["a".into(), 1_i64.into()]);
        assert!(!eval(&contains_any, "k", &attrs([("tags", mixed)])));
    }

    #[test]
    fn boolean_matcher() {
        let matcher = Matcher::new(MatcherKind::EqualToBoolean(true)).on_attribute("beta");
        assert!(eval(&matcher, "k", &attrs([("beta", true.into())])));
        assert!(eval(&matcher, "k", &attrs([("beta", "TRUE".into())])));
        assert!(!eval(&matcher, "k", &attrs([("beta", false.into())])));
        assert!(!eval(&matcher, "k", &attrs([("beta", "yes".into())])));
        assert!(!eval(&matcher, "k", &attrs([("beta", 1_i64.into())])));
    }

    #[test]
    fn regex_matcher() {
        let matcher = Matcher::new(MatcherKind::MatchesString(Some(
            regex::Regex::new(r"\d{3}").unwrap(),
        )));
        assert!(eval(&matcher, "user-123-x", &Attributes::new()));
        assert!(!eval(&matcher, "user-12", &Attributes::new()));

        let invalid = Matcher::new(MatcherKind::MatchesString(None));
        assert!(!eval(&invalid, "anything", &Attributes::new()));
        assert!(eval(&invalid.negated(), "anything", &Attributes::new()));
    }

    #[test]
    fn semver_matchers() {
        let version = |s: &str| s.parse::<Semver>().ok();
        let app = |v: &str| attrs([("app_version", v.into())]);

        let equal = Matcher::new(MatcherKind::EqualToSemver(version("1.2.3+build.7")))
            .on_attribute("app_version");
        assert!(eval(&equal, "k", &app("1.2.3+build.7")));
        assert!(!eval(&equal, "k", &app("1.2.3")));

        let gte = Matcher::new(MatcherKind::GreaterThanOrEqualToSemver(version("2.0.0")))
            .on_attribute("app_version");
        assert!(eval(&gte, "k", &app("2.0.0+anything")));
        assert!(eval(&gte, "k", &app("2.1.0")));
        assert!(!eval(&gte, "k", &app("2.0.0-rc.1")));
        assert!(!eval(&gte, "k", &app("not a version")));

        let lte = Matcher::new(MatcherKind::LessThanOrEqualToSemver(version("2.0.0")))
            .on_attribute("app_version");
        assert!(eval(&lte, "k", &app("2.0.0-rc.1")));
        assert!(!eval(&lte, "k", &app("2.0.1")));

        let between = Matcher::new(MatcherKind::BetweenSemver(
            version("1.0.0").zip(version("1.9.9")),
        ))
        .on_attribute("app_version");
        assert!(eval(&between, "k", &app("1.4.0")));
        assert!(!eval(&between, "k", &app("1.0.0-alpha")));

        let in_list = Matcher::new(MatcherKind::InListSemver(
            strings(&["1.2.3", "2.0.0-rc.1"]).into_iter().collect(),
        ))
        .on_attribute("app_version");
        assert!(eval(&in_list, "k", &app("2.0.0-rc.1")));
        assert!(eval(&in_list, "k", &app("01.02.03")));
        assert!(!eval(&in_list, "k", &app("1.2.4")));
    }

    #[test]
    fn dependency_on_missing_flag_sees_control() {
        let matcher = Matcher::new(MatcherKind::Dependency {
            flag: "unknown".into(),
            treatments: strings(&["control"]).into_iter().collect(),
        });
        assert!(eval(&matcher, "k", &HashMap::new()));
    }
}
