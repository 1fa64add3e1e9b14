//! Per-mode impression processing.
use std::sync::Arc;

use crate::{Attributes, Str};

use super::{now_millis, truncate_hour, Impression, ImpressionObserver};

/// An impression and the attributes it was evaluated with.
pub type ImpressionWithAttributes = (Impression, Option<Arc<Attributes>>);

/// What to do with a batch of impressions.
#[derive(Debug, Default)]
pub struct StrategyOutput {
    /// Impressions to send to storage.
    pub to_store: Vec<Impression>,
    /// Impressions to hand to the impression listener.
    pub to_listener: Vec<ImpressionWithAttributes>,
    /// Impressions to count.
    pub for_counter: Vec<Impression>,
    /// `(key, flag)` pairs to track as unique keys.
    pub for_unique_keys: Vec<(Str, Str)>,
}

/// Decides, per impressions mode, where impressions go.
pub trait ProcessStrategy {
    /// Route a batch of impressions.
    fn process_impressions(&self, impressions: Vec<ImpressionWithAttributes>) -> StrategyOutput;
}

/// Stores each distinct impression at most once per hour. Everything is counted.
pub struct OptimizedStrategy {
    observer: ImpressionObserver,
    now: fn() -> i64,
}

impl OptimizedStrategy {
    /// Create a strategy deduplicating with `observer` against the system clock.
    pub fn new(observer: ImpressionObserver) -> Self {
        Self::with_clock(observer, now_millis)
    }

    /// Create a strategy reading the current time, in epoch milliseconds, from `now`.
    pub fn with_clock(observer: ImpressionObserver, now: fn() -> i64) -> Self {
        OptimizedStrategy { observer, now }
    }
}

impl ProcessStrategy for OptimizedStrategy {
    fn process_impressions(&self, impressions: Vec<ImpressionWithAttributes>) -> StrategyOutput {
        let this_hour = truncate_hour((self.now)());
        let observed = impressions
            .into_iter()
            .map(|(impression, attributes)| (self.observer.test_and_set(&impression), attributes))
            .collect::<Vec<_>>();

        let to_store = observed
            .iter()
            .map(|(impression, _)| impression)
            .filter(|impression| should_store(impression, this_hour))
            .cloned()
            .collect::<Vec<_>>();
        let for_counter = observed
            .iter()
            .map(|(impression, _)| impression.clone())
            .collect();

        log::debug!(target: "split",
                    stored = to_store.len(),
                    observed = observed.len();
                    "processed impressions in optimized mode");

        StrategyOutput {
            to_store,
            to_listener: observed,
            for_counter,
            for_unique_keys: Vec::new(),
        }
    }
}

/// Impressions already seen during the current hour are not stored again.
fn should_store(impression: &Impression, this_hour: i64) -> bool {
    impression
        .previous_time
        .map_or(true, |previous| previous < this_hour)
}

/// Stores every impression. Nothing is counted.
pub struct DebugStrategy {
    observer: ImpressionObserver,
}

impl DebugStrategy {
    /// Create a strategy annotating impressions with `observer`.
    pub fn new(observer: ImpressionObserver) -> Self {
        DebugStrategy { observer }
    }
}

impl ProcessStrategy for DebugStrategy {
    fn process_impressions(&self, impressions: Vec<ImpressionWithAttributes>) -> StrategyOutput {
        let observed = impressions
            .into_iter()
            .map(|(impression, attributes)| (self.observer.test_and_set(&impression), attributes))
            .collect::<Vec<_>>();

        StrategyOutput {
            to_store: observed.iter().map(|(impression, _)| impression.clone()).collect(),
            to_listener: observed,
            for_counter: Vec::new(),
            for_unique_keys: Vec::new(),
        }
    }
}

/// Stores nothing. Impressions are counted and their keys tracked.
#[derive(Debug, Default)]
pub struct NoneStrategy;

impl ProcessStrategy for NoneStrategy {
    fn process_impressions(&self, impressions: Vec<ImpressionWithAttributes>) -> StrategyOutput {
        let for_counter = impressions
            .iter()
            .map(|(impression, _)| impression.clone())
            .collect::<Vec<_>>();
        let for_unique_keys = for_counter
            .iter()
            .map(|impression| (impression.matching_key.clone(), impression.feature.clone()))
            .collect();

        StrategyOutput {
            to_store: Vec::new(),
            to_listener: impressions,
            for_counter,
            for_unique_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use crate::impressions::{now_millis, Impression, ImpressionObserver};

    use super::{
        DebugStrategy, ImpressionWithAttributes, NoneStrategy, OptimizedStrategy, ProcessStrategy,
    };

    const HOUR: i64 = 3_600_000;

    fn impression(key: &str, time: i64) -> ImpressionWithAttributes {
        (
            Impression {
                matching_key: key.into(),
                feature: "checkout".into(),
                treatment: "on".into(),
                label: "default rule".into(),
                change_number: 1,
                bucketing_key: None,
                time,
                previous_time: None,
            },
            None,
        )
    }

    fn observer() -> ImpressionObserver {
        ImpressionObserver::new(100).unwrap()
    }

    #[test]
    fn optimized_stores_once_per_hour() {
        static NOW: AtomicI64 = AtomicI64::new(0);
        fn now() -> i64 {
            NOW.load(Ordering::SeqCst)
        }

        let strategy = OptimizedStrategy::with_clock(observer(), now);
        let start = 5 * HOUR + 1000;
        NOW.store(start, Ordering::SeqCst);

        let output = strategy.process_impressions(vec![impression("user-1", start)]);
        assert_eq!(output.to_store.len(), 1);

        NOW.store(start + 20, Ordering::SeqCst);
        let output = strategy.process_impressions(vec![
            impression("user-1", start + 10),
            impression("user-2", start + 20),
        ]);
        assert_eq!(output.to_store.len(), 1);
        assert_eq!(output.to_store[0].matching_key, "user-2");
        assert_eq!(output.to_listener.len(), 2);
        assert_eq!(output.to_listener[0].0.previous_time, Some(start));
        assert_eq!(output.for_counter.len(), 2);
        assert!(output.for_unique_keys.is_empty());

        NOW.store(6 * HOUR, Ordering::SeqCst);
        let output = strategy.process_impressions(vec![impression("user-1", 6 * HOUR)]);
        assert_eq!(output.to_store.len(), 1);
        assert_eq!(output.to_store[0].previous_time, Some(start + 10));
    }

    #[test]
    fn optimized_compares_against_current_hour() {
        let strategy = OptimizedStrategy::new(observer());
        let earlier = now_millis() - 3 * HOUR;

        let first = strategy.process_impressions(vec![impression("user-1", earlier)]);
        assert_eq!(first.to_store.len(), 1);

        // Processed late: the previous sighting is hours old by the clock, so it is stored.
        let second = strategy.process_impressions(vec![impression("user-1", earlier + 10)]);
        assert_eq!(second.to_listener[0].0.previous_time, Some(earlier));
        assert_eq!(second.to_store.len(), 1);
    }

    #[test]
    fn debug_stores_everything() {
        let strategy = DebugStrategy::new(observer());
        let output = strategy.process_impressions(vec![
            impression("user-1", 1000),
            impression("user-1", 1010),
        ]);
        assert_eq!(output.to_store.len(), 2);
        assert_eq!(output.to_store[1].previous_time, Some(1000));
        assert_eq!(output.to_listener.len(), 2);
        assert!(output.for_counter.is_empty());
        assert!(output.for_unique_keys.is_empty());
    }

    #[test]
    fn none_only_counts() {
        let output = NoneStrategy.process_impressions(vec![
            impression("user-1", 1000),
            impression("user-1", 1010),
        ]);
        assert!(output.to_store.is_empty());
        assert_eq!(output.to_listener.len(), 2);
        assert_eq!(output.for_counter.len(), 2);
        assert_eq!(
            output.for_unique_keys[0],
            ("user-1".into(), "checkout".into())
        );
        assert_eq!(output.to_listener[0].0.previous_time, None);
    }
}
