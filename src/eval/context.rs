use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{models::FeatureFlag, Attributes, Configuration, Error, Result, Str};

use super::{Evaluation, Evaluator, SegmentMembership};

/// Per-call evaluation state.
///
/// A context is created for every call into [`Evaluator`] and shared by all flags evaluated in
/// that call, including dependencies. It pins the configuration snapshot, so that a flag and the
/// flags it depends on are always evaluated against the same definitions.
pub struct EvaluationContext<'a> {
    evaluator: &'a Evaluator,
    configuration: Option<Arc<Configuration>>,
    segments: Option<&'a dyn SegmentMembership>,
    bucketing_key: &'a str,
    memo: RefCell<HashMap<(Str, String), Evaluation>>,
    in_progress: RefCell<HashSet<Str>>,
    cycle_hit: Cell<bool>,
}

impl<'a> EvaluationContext<'a> {
    pub(crate) fn new(
        evaluator: &'a Evaluator,
        configuration: Option<Arc<Configuration>>,
        segments: Option<&'a dyn SegmentMembership>,
        bucketing_key: &'a str,
    ) -> EvaluationContext<'a> {
        EvaluationContext {
            evaluator,
            configuration,
            segments,
            bucketing_key,
            memo: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(HashSet::new()),
            cycle_hit: Cell::new(false),
        }
    }

    /// Key used for bucketing. Defaults to the matching key.
    pub fn bucketing_key(&self) -> &str {
        self.bucketing_key
    }

    /// Flag from the configuration snapshot of this context.
    pub fn get_flag(&self, name: &str) -> Option<&Arc<FeatureFlag>> {
        self.configuration.as_ref()?.get_flag(name)
    }

    /// Check segment membership of `key`.
    ///
    /// Fails if the evaluator was configured without a segment membership lookup.
    pub fn is_in_segment(&self, segment: &Str, key: &str) -> Result<bool> {
        let segments = self
            .segments
            .ok_or_else(|| Error::SegmentMembershipMissing {
                segment: segment.clone(),
            })?;
        Ok(segments.is_in_segment(segment, key))
    }

    /// Evaluate flag `name` for `key`, reusing the result if it was already evaluated in this
    /// context.
    ///
    /// A result computed while a dependency cycle was cut short depends on where the cycle was
    /// entered, so it is not remembered.
    pub(crate) fn evaluate_by_name(
        &self,
        name: &str,
        key: &str,
        attributes: &Attributes,
    ) -> Result<Evaluation> {
        let memo_key = (Str::from(name), key.to_owned());
        let cached = self.memo.borrow().get(&memo_key).cloned();
        if let Some(evaluation) = cached {
            return Ok(evaluation);
        }

        let outer_cycle_hit = self.cycle_hit.replace(false);
        let evaluation = match self.get_flag(name) {
            Some(flag) => self.evaluator.evaluate_with_context(flag, key, attributes, self),
            None => Ok(Evaluation::not_found()),
        };
        let cycle_hit = self.cycle_hit.get();
        self.cycle_hit.set(outer_cycle_hit || cycle_hit);
        let evaluation = evaluation?;

        if !cycle_hit {
            self.memo.borrow_mut().insert(memo_key, evaluation.clone());
        }
        Ok(evaluation)
    }

    /// Evaluate a flag another flag depends on.
    ///
    /// Returns `None` if `flag` is already being evaluated in this context, i.e., the flags
    /// depend on each other.
    pub(crate) fn evaluate_dependency(
        &self,
        flag: &Str,
        key: &str,
        attributes: &Attributes,
    ) -> Result<Option<Evaluation>> {
        if self.in_progress.borrow().contains(flag) {
            log::warn!(target: "split",
                       flag_name:display = flag,
                       key;
                       "dependency cycle detected, dependency matcher will not match");
            self.cycle_hit.set(true);
            return Ok(None);
        }

        self.evaluate_by_name(flag, key, attributes).map(Some)
    }

    /// Mark `flag` as being evaluated until the returned guard is dropped.
    pub(crate) fn enter(&self, flag: &Str) -> InProgress<'_> {
        self.in_progress.borrow_mut().insert(flag.clone());
        InProgress {
            in_progress: &self.in_progress,
            flag: flag.clone(),
        }
    }
}

pub(crate) struct InProgress<'c> {
    in_progress: &'c RefCell<HashSet<Str>>,
    flag: Str,
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.in_progress.borrow_mut().remove(&self.flag);
    }
}
