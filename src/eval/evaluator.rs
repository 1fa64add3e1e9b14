use std::{collections::HashMap, sync::Arc};

use crate::{
    configuration_store::ConfigurationStore,
    labels,
    models::{Combiner, Condition, ConditionType, FeatureFlag},
    splitter::{get_bucket, get_treatment},
    Attributes, Result, Str,
};

use super::{Evaluation, EvaluationContext, SegmentMembership};

/// Collaborators of [`Evaluator`].
pub struct EvaluatorConfig {
    /// Source of flag definitions. Each evaluation call reads one snapshot.
    pub configuration_store: Arc<ConfigurationStore>,
    /// Lookup used by `IN_SEGMENT` matchers. Evaluating such a matcher without it is an error.
    pub segment_membership: Option<Arc<dyn SegmentMembership + Send + Sync>>,
}

/// Evaluator computes treatments for keys.
///
/// It holds no mutable state and can be shared between threads.
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Create a new evaluator.
    pub fn new(config: EvaluatorConfig) -> Evaluator {
        Evaluator { config }
    }

    /// Evaluate flag `flag_name` for `key`.
    ///
    /// `bucketing_key` defaults to `key`. A flag that doesn't exist (or a store without
    /// configuration) evaluates to `control` with the "definition not found" label.
    ///
    /// Only configuration errors are returned as `Err`.
    pub fn evaluate(
        &self,
        flag_name: &str,
        key: &str,
        bucketing_key: Option<&str>,
        attributes: &Attributes,
    ) -> Result<Evaluation> {
        let ctx = self.context(bucketing_key.unwrap_or(key));
        ctx.evaluate_by_name(flag_name, key, attributes)
    }

    /// Evaluate several flags for the same key.
    ///
    /// Flags are evaluated independently but share one context, so a flag that is a dependency
    /// of several others is evaluated only once.
    pub fn evaluate_many<'f>(
        &self,
        flag_names: impl IntoIterator<Item = &'f str>,
        key: &str,
        bucketing_key: Option<&str>,
        attributes: &Attributes,
    ) -> Result<HashMap<Str, Evaluation>> {
        let ctx = self.context(bucketing_key.unwrap_or(key));
        flag_names
            .into_iter()
            .map(|flag_name| -> Result<(Str, Evaluation)> {
                let evaluation = ctx.evaluate_by_name(flag_name, key, attributes)?;
                Ok((flag_name.into(), evaluation))
            })
            .collect()
    }

    /// Evaluate an already compiled flag that is not necessarily part of the stored
    /// configuration. Dependencies are still resolved from the store.
    pub fn evaluate_flag(
        &self,
        flag: &FeatureFlag,
        key: &str,
        bucketing_key: Option<&str>,
        attributes: &Attributes,
    ) -> Result<Evaluation> {
        let ctx = self.context(bucketing_key.unwrap_or(key));
        self.evaluate_with_context(flag, key, attributes, &ctx)
    }

    fn context<'a>(&'a self, bucketing_key: &'a str) -> EvaluationContext<'a> {
        EvaluationContext::new(
            self,
            self.config.configuration_store.get_configuration(),
            self.config
                .segment_membership
                .as_deref()
                .map(|it| it as &dyn SegmentMembership),
            bucketing_key,
        )
    }

    pub(crate) fn evaluate_with_context(
        &self,
        flag: &FeatureFlag,
        key: &str,
        attributes: &Attributes,
        ctx: &EvaluationContext,
    ) -> Result<Evaluation> {
        let _in_progress = ctx.enter(&flag.name);

        let evaluation = evaluate_conditions(flag, key, attributes, ctx).inspect_err(|err| {
            log::warn!(target: "split",
                       flag_name:display = flag.name,
                       key,
                       attributes:serde = attributes;
                       "error occurred while evaluating a flag: {err}");
        })?;

        log::trace!(target: "split",
                    flag_name:display = flag.name,
                    key,
                    bucketing_key = ctx.bucketing_key(),
                    treatment:display = evaluation.treatment,
                    label:display = evaluation.label;
                    "evaluated a flag");

        Ok(evaluation)
    }
}

fn evaluate_conditions(
    flag: &FeatureFlag,
    key: &str,
    attributes: &Attributes,
    ctx: &EvaluationContext,
) -> Result<Evaluation> {
    if flag.killed {
        return Ok(Evaluation::new(
            flag,
            flag.default_treatment.clone(),
            labels::KILLED,
        ));
    }

    let bucketing_key = ctx.bucketing_key();
    let mut traffic_checked = false;

    for condition in flag.conditions.iter() {
        if !traffic_checked && condition.condition_type == ConditionType::Rollout {
            if !is_in_traffic_allocation(flag, bucketing_key) {
                return Ok(Evaluation::new(
                    flag,
                    flag.default_treatment.clone(),
                    labels::NOT_IN_SPLIT,
                ));
            }
            traffic_checked = true;
        }

        if condition.matches(key, attributes, ctx)? {
            let treatment = get_treatment(bucketing_key, flag.seed, &condition.partitions, flag.algo);
            return Ok(Evaluation::new(flag, treatment, condition.label.clone()));
        }
    }

    Ok(Evaluation::new(
        flag,
        flag.default_treatment.clone(),
        labels::DEFAULT_RULE,
    ))
}

fn is_in_traffic_allocation(flag: &FeatureFlag, bucketing_key: &str) -> bool {
    flag.traffic_allocation >= 100
        || i32::from(get_bucket(
            bucketing_key,
            flag.traffic_allocation_seed,
            flag.algo,
        )) <= flag.traffic_allocation
}

impl Condition {
    /// Return `true` if all matchers of the condition match. Stops at the first one that doesn't.
    pub(crate) fn matches(
        &self,
        key: &str,
        attributes: &Attributes,
        ctx: &EvaluationContext,
    ) -> Result<bool> {
        match self.combiner {
            Combiner::And => {
                for matcher in self.matchers.iter() {
                    if !matcher.evaluate(key, attributes, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}
