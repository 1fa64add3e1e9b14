use std::sync::Arc;

use crate::{ImpressionsConfig, Result, Str};

use super::{
    Counter, DebugStrategy, Impression, ImpressionListener, ImpressionObserver,
    ImpressionWithAttributes, ImpressionsMode, NoneStrategy, OptimizedStrategy, ProcessStrategy,
    UniqueKeysTracker,
};

/// Result of [`ImpressionsManager::process`].
#[derive(Debug, Default)]
pub struct ProcessedImpressions {
    /// Impressions to send to storage.
    pub to_store: Vec<Impression>,
    /// Impressions delivered to the listener (or that would have been, if none is set).
    pub to_listener: Vec<ImpressionWithAttributes>,
    /// Impressions added to the counter.
    pub counted: Vec<Impression>,
    /// `(key, flag)` pairs passed to the unique keys tracker.
    pub unique_keys: Vec<(Str, Str)>,
}

/// Routes impressions according to the impressions mode.
///
/// Build one with [`ImpressionsConfig::to_manager`].
pub struct ImpressionsManager<'a> {
    mode: ImpressionsMode,
    strategy: Box<dyn ProcessStrategy + Send + Sync>,
    counter: Arc<Counter>,
    unique_keys_tracker: Arc<UniqueKeysTracker>,
    listener: Option<Box<dyn ImpressionListener + Send + Sync + 'a>>,
}

impl<'a> ImpressionsManager<'a> {
    /// Create a manager from configuration.
    pub fn new(config: ImpressionsConfig<'a>) -> Result<Self> {
        let strategy: Box<dyn ProcessStrategy + Send + Sync> = match config.mode {
            ImpressionsMode::Optimized => Box::new(OptimizedStrategy::with_clock(
                ImpressionObserver::new(config.observer_cache_size)?,
                config.clock,
            )),
            ImpressionsMode::Debug => Box::new(DebugStrategy::new(ImpressionObserver::new(
                config.observer_cache_size,
            )?)),
            ImpressionsMode::None => Box::new(NoneStrategy),
        };

        Ok(ImpressionsManager {
            mode: config.mode,
            strategy,
            counter: Arc::new(Counter::new()),
            unique_keys_tracker: Arc::new(UniqueKeysTracker::new(
                config.unique_keys_threshold,
                config.bloom_filter_capacity,
                config.bloom_filter_error_rate,
            )?),
            listener: config.listener,
        })
    }

    /// Impressions mode the manager was built for.
    pub fn mode(&self) -> ImpressionsMode {
        self.mode
    }

    /// Counter fed by the manager. Drain it with [`Counter::pop_all`].
    pub fn counter(&self) -> &Arc<Counter> {
        &self.counter
    }

    /// Unique keys tracker fed by the manager.
    pub fn unique_keys_tracker(&self) -> &Arc<UniqueKeysTracker> {
        &self.unique_keys_tracker
    }

    /// Process a batch of impressions.
    ///
    /// Counts and unique keys are recorded, and every impression is delivered to the listener.
    /// Listener errors are logged and don't stop delivery of the rest.
    pub fn process(&self, impressions: Vec<ImpressionWithAttributes>) -> ProcessedImpressions {
        let output = self.strategy.process_impressions(impressions);

        if !output.for_counter.is_empty() {
            self.counter.track(&output.for_counter, 1);
        }
        for (key, flag) in &output.for_unique_keys {
            self.unique_keys_tracker.track(key, flag);
        }

        if let Some(listener) = &self.listener {
            for (impression, attributes) in &output.to_listener {
                if let Err(err) = listener.log_impression(impression, attributes.as_deref()) {
                    log::warn!(target: "split",
                               flag_name:display = impression.feature,
                               key:display = impression.matching_key;
                               "impression listener failed: {err}");
                }
            }
        }

        log::debug!(target: "split",
                    mode:display = self.mode,
                    to_store = output.to_store.len(),
                    to_listener = output.to_listener.len(),
                    counted = output.for_counter.len(),
                    unique_keys = output.for_unique_keys.len();
                    "processed impressions");

        ProcessedImpressions {
            to_store: output.to_store,
            to_listener: output.to_listener,
            counted: output.for_counter,
            unique_keys: output.for_unique_keys,
        }
    }
}
