use regex::Regex;

use crate::wire::{MatcherTypeWire, MatcherWire};

use super::{Matcher, MatcherKind, NumericDataType, Semver};

impl Matcher {
    /// Compile a wire matcher. Returns `None` if the matcher lacks the data its type requires.
    pub(crate) fn compile(wire: MatcherWire) -> Option<Matcher> {
        let attribute = wire
            .key_selector
            .as_ref()
            .and_then(|selector| selector.attribute.clone());
        let negate = wire.negate;
        let kind = compile_kind(wire)?;
        Some(Matcher {
            kind,
            negate,
            attribute,
        })
    }
}

fn compile_kind(wire: MatcherWire) -> Option<MatcherKind> {
    let whitelist = |wire: MatcherWire| wire.whitelist_matcher_data.map(|data| data.whitelist);

    let kind = match wire.matcher_type {
        MatcherTypeWire::AllKeys => MatcherKind::AllKeys,
        MatcherTypeWire::InSegment => MatcherKind::InSegment {
            segment: wire.user_defined_segment_matcher_data?.segment_name.into(),
        },

        MatcherTypeWire::Whitelist => {
            MatcherKind::Whitelist(whitelist(wire)?.into_iter().collect())
        }
        MatcherTypeWire::StartsWith => MatcherKind::StartsWith(whitelist(wire)?.into()),
        MatcherTypeWire::EndsWith => MatcherKind::EndsWith(whitelist(wire)?.into()),
        MatcherTypeWire::ContainsString => MatcherKind::ContainsString(whitelist(wire)?.into()),

        MatcherTypeWire::EqualTo => {
            let data = wire.unary_numeric_matcher_data?;
            let data_type = NumericDataType::for_equality(data.data_type);
            MatcherKind::EqualTo {
                data_type,
                value: data_type.normalize(data.value),
            }
        }
        MatcherTypeWire::GreaterThanOrEqualTo => {
            let data = wire.unary_numeric_matcher_data?;
            let data_type = NumericDataType::for_range(data.data_type);
            MatcherKind::GreaterThanOrEqualTo {
                data_type,
                value: data_type.normalize(data.value),
            }
        }
        MatcherTypeWire::LessThanOrEqualTo => {
            let data = wire.unary_numeric_matcher_data?;
            let data_type = NumericDataType::for_range(data.data_type);
            MatcherKind::LessThanOrEqualTo {
                data_type,
                value: data_type.normalize(data.value),
            }
        }
        MatcherTypeWire::Between => {
            let data = wire.between_matcher_data?;
            let data_type = NumericDataType::for_range(data.data_type);
            MatcherKind::Between {
                data_type,
                start: data_type.normalize(data.start),
                end: data_type.normalize(data.end),
            }
        }

        MatcherTypeWire::EqualToSet => {
            MatcherKind::EqualToSet(whitelist(wire)?.into_iter().collect())
        }
        MatcherTypeWire::PartOfSet => MatcherKind::PartOfSet(whitelist(wire)?.into_iter().collect()),
        MatcherTypeWire::ContainsAllOfSet => {
            MatcherKind::ContainsAllOfSet(whitelist(wire)?.into_iter().collect())
        }
        MatcherTypeWire::ContainsAnyOfSet => {
            MatcherKind::ContainsAnyOfSet(whitelist(wire)?.into_iter().collect())
        }

        MatcherTypeWire::EqualToBoolean => MatcherKind::EqualToBoolean(wire.boolean_matcher_data?),
        MatcherTypeWire::MatchesString => {
            MatcherKind::MatchesString(compile_regex(&wire.string_matcher_data?))
        }

        MatcherTypeWire::EqualToSemver => {
            MatcherKind::EqualToSemver(parse_semver(&wire.string_matcher_data?))
        }
        MatcherTypeWire::GreaterThanOrEqualToSemver => {
            MatcherKind::GreaterThanOrEqualToSemver(parse_semver(&wire.string_matcher_data?))
        }
        MatcherTypeWire::LessThanOrEqualToSemver => {
            MatcherKind::LessThanOrEqualToSemver(parse_semver(&wire.string_matcher_data?))
        }
        MatcherTypeWire::BetweenSemver => {
            let data = wire.between_string_matcher_data?;
            MatcherKind::BetweenSemver(parse_semver(&data.start).zip(parse_semver(&data.end)))
        }
        MatcherTypeWire::InListSemver => MatcherKind::InListSemver(
            whitelist(wire)?
                .iter()
                .filter_map(|version| parse_semver(version))
                .map(|version| version.version().to_owned())
                .collect(),
        ),

        MatcherTypeWire::InSplitTreatment => {
            let data = wire.dependency_matcher_data?;
            MatcherKind::Dependency {
                flag: data.split.into(),
                treatments: data.treatments.into_iter().collect(),
            }
        }
    };

    Some(kind)
}

fn compile_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            log::warn!(target: "split",
                       pattern;
                       "invalid regex in MATCHES_STRING matcher, matcher will never match: {err}");
            None
        }
    }
}

fn parse_semver(version: &str) -> Option<Semver> {
    match version.parse() {
        Ok(semver) => Some(semver),
        Err(err) => {
            log::warn!(target: "split",
                       version;
                       "semver matcher will never match: {err}");
            None
        }
    }
}
