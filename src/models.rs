//! Compiled flag definitions.
//!
//! Flags are compiled from their wire format once, when configuration is loaded, so that
//! evaluation never parses regexes, versions or dates.
use std::collections::HashMap;

use crate::{
    hash::HashAlgorithm,
    labels,
    matchers::{Matcher, MatcherKind},
    wire::{CombinerWire, ConditionTypeWire, ConditionWire, FeatureFlagWire, PartitionWire},
    Result, Str,
};

/// A compiled feature flag. Immutable once built.
#[derive(Debug, Clone)]
pub struct FeatureFlag {
    pub(crate) name: Str,
    pub(crate) seed: i32,
    pub(crate) traffic_allocation: i32,
    pub(crate) traffic_allocation_seed: i32,
    pub(crate) killed: bool,
    pub(crate) default_treatment: Str,
    pub(crate) change_number: i64,
    pub(crate) algo: HashAlgorithm,
    pub(crate) conditions: Box<[Condition]>,
    pub(crate) configurations: HashMap<Str, Str>,
}

/// Matchers combined with AND, plus the partitions that apply when they match.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) condition_type: ConditionType,
    pub(crate) combiner: Combiner,
    pub(crate) matchers: Box<[Matcher]>,
    pub(crate) partitions: Box<[Partition]>,
    pub(crate) label: Str,
}

/// Whether traffic allocation applies before a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    /// Explicit targeting. Evaluated regardless of traffic allocation.
    Whitelist,
    /// Percentage rollout. Traffic allocation is checked before the first one.
    Rollout,
}

/// How matchers of a condition are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combiner {
    /// All matchers must match.
    And,
}

/// Share of buckets receiving a treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Treatment name.
    pub treatment: Str,
    /// Percentage of buckets, 0 to 100.
    pub size: u32,
}

impl FeatureFlag {
    /// Parse and compile a single flag definition.
    pub fn from_json(json: &str) -> Result<FeatureFlag> {
        let wire: FeatureFlagWire = serde_json::from_str(json)?;
        Ok(FeatureFlag::compile(wire))
    }

    /// Compile a flag from its wire format.
    ///
    /// A flag that uses any matcher this crate cannot compile has its conditions replaced with a
    /// single rollout condition serving `control` to everybody.
    pub fn compile(wire: FeatureFlagWire) -> FeatureFlag {
        let conditions = compile_conditions(wire.conditions).unwrap_or_else(|| {
            log::warn!(target: "split",
                       flag_name:display = wire.name;
                       "flag uses an unsupported matcher, serving control");
            vec![unsupported_condition()].into_boxed_slice()
        });

        FeatureFlag {
            name: wire.name.into(),
            seed: wire.seed,
            traffic_allocation: wire.traffic_allocation,
            traffic_allocation_seed: wire.traffic_allocation_seed,
            killed: wire.killed,
            default_treatment: wire.default_treatment.into(),
            change_number: wire.change_number,
            algo: wire.algo,
            conditions,
            configurations: wire
                .configurations
                .unwrap_or_default()
                .into_iter()
                .map(|(treatment, config)| (treatment.into(), config.into()))
                .collect(),
        }
    }

    /// Flag name.
    pub fn name(&self) -> &Str {
        &self.name
    }

    /// Version of the definition.
    pub fn change_number(&self) -> i64 {
        self.change_number
    }

    /// Treatment served when the flag is killed or no condition matches.
    pub fn default_treatment(&self) -> &Str {
        &self.default_treatment
    }

    /// Whether the flag is killed.
    pub fn killed(&self) -> bool {
        self.killed
    }

    /// Compiled conditions, in evaluation order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Dynamic configuration attached to `treatment`, if any.
    pub fn get_configurations_for(&self, treatment: &str) -> Option<&Str> {
        self.configurations.get(treatment)
    }
}

impl Condition {
    /// Condition type.
    pub fn condition_type(&self) -> ConditionType {
        self.condition_type
    }

    /// Label reported when this condition fires.
    pub fn label(&self) -> &Str {
        &self.label
    }

    /// Partitions of the condition.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Matchers of the condition.
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }
}

/// Returns `None` if any matcher failed to parse or compile.
fn compile_conditions(conditions: Vec<ConditionWire>) -> Option<Box<[Condition]>> {
    conditions.into_iter().map(compile_condition).collect()
}

fn compile_condition(condition: ConditionWire) -> Option<Condition> {
    let matchers = condition
        .matcher_group
        .matchers
        .into_iter()
        .map(|matcher| Option::from(matcher).and_then(Matcher::compile))
        .collect::<Option<Box<[_]>>>()?;

    Some(Condition {
        condition_type: condition.condition_type.into(),
        combiner: condition.matcher_group.combiner.into(),
        matchers,
        partitions: condition
            .partitions
            .into_iter()
            .map(Partition::from)
            .collect(),
        label: condition.label.into(),
    })
}

fn unsupported_condition() -> Condition {
    Condition {
        condition_type: ConditionType::Rollout,
        combiner: Combiner::And,
        matchers: Box::new([Matcher::new(MatcherKind::AllKeys)]),
        partitions: Box::new([Partition {
            treatment: labels::CONTROL.into(),
            size: 100,
        }]),
        label: labels::UNSUPPORTED_MATCHER_TYPE.into(),
    }
}

impl From<ConditionTypeWire> for ConditionType {
    fn from(value: ConditionTypeWire) -> Self {
        match value {
            ConditionTypeWire::Whitelist => ConditionType::Whitelist,
            ConditionTypeWire::Rollout => ConditionType::Rollout,
        }
    }
}

impl From<CombinerWire> for Combiner {
    fn from(value: CombinerWire) -> Self {
        match value {
            CombinerWire::And => Combiner::And,
        }
    }
}

impl From<PartitionWire> for Partition {
    fn from(value: PartitionWire) -> Self {
        Partition {
            treatment: value.treatment.into(),
            size: value.size,
        }
    }
}
