use crate::{
    impressions::{
        now_millis, ImpressionListener, ImpressionObserver, ImpressionsManager, ImpressionsMode,
        UniqueKeysTracker,
    },
    Result,
};

/// Configuration for [`ImpressionsManager`].
///
/// # Examples
/// ```
/// # use split_core::{Attributes, ImpressionsConfig};
/// # use split_core::impressions::{Impression, ImpressionsMode, ListenerError};
/// let manager = ImpressionsConfig::new(ImpressionsMode::Optimized)
///     .observer_cache_size(10_000)
///     .listener(
///         |impression: &Impression, _: Option<&Attributes>| -> Result<(), ListenerError> {
///             println!("{:?}", impression);
///             Ok(())
///         },
///     )
///     .to_manager()
///     .unwrap();
/// ```
pub struct ImpressionsConfig<'a> {
    pub(crate) mode: ImpressionsMode,
    pub(crate) observer_cache_size: usize,
    pub(crate) unique_keys_threshold: usize,
    pub(crate) bloom_filter_capacity: usize,
    pub(crate) bloom_filter_error_rate: f64,
    pub(crate) listener: Option<Box<dyn ImpressionListener + Send + Sync + 'a>>,
    pub(crate) clock: fn() -> i64,
}

impl<'a> ImpressionsConfig<'a> {
    /// Default capacity of the impression observer.
    pub const DEFAULT_OBSERVER_CACHE_SIZE: usize = ImpressionObserver::DEFAULT_CACHE_SIZE;

    /// Default number of unique keys above which the tracker asks to be flushed.
    pub const DEFAULT_UNIQUE_KEYS_THRESHOLD: usize = UniqueKeysTracker::DEFAULT_THRESHOLD;

    /// Default number of keys the unique keys filter is sized for.
    pub const DEFAULT_BLOOM_FILTER_CAPACITY: usize = 30_000;

    /// Default false positive rate of the unique keys filter.
    pub const DEFAULT_BLOOM_FILTER_ERROR_RATE: f64 = 0.01;

    /// Create a default configuration for `mode`.
    ///
    /// ```
    /// # use split_core::{ImpressionsConfig, impressions::ImpressionsMode};
    /// ImpressionsConfig::new(ImpressionsMode::Debug);
    /// ```
    pub fn new(mode: ImpressionsMode) -> Self {
        ImpressionsConfig {
            mode,
            observer_cache_size: Self::DEFAULT_OBSERVER_CACHE_SIZE,
            unique_keys_threshold: Self::DEFAULT_UNIQUE_KEYS_THRESHOLD,
            bloom_filter_capacity: Self::DEFAULT_BLOOM_FILTER_CAPACITY,
            bloom_filter_error_rate: Self::DEFAULT_BLOOM_FILTER_ERROR_RATE,
            listener: None,
            clock: now_millis,
        }
    }

    /// Number of distinct impressions remembered for deduplication.
    pub fn observer_cache_size(mut self, observer_cache_size: usize) -> Self {
        self.observer_cache_size = observer_cache_size;
        self
    }

    /// Number of unique keys above which the tracker's queue-full hook is called.
    pub fn unique_keys_threshold(mut self, unique_keys_threshold: usize) -> Self {
        self.unique_keys_threshold = unique_keys_threshold;
        self
    }

    /// Number of keys the unique keys filter is sized for.
    pub fn bloom_filter_capacity(mut self, bloom_filter_capacity: usize) -> Self {
        self.bloom_filter_capacity = bloom_filter_capacity;
        self
    }

    /// False positive rate of the unique keys filter.
    pub fn bloom_filter_error_rate(mut self, bloom_filter_error_rate: f64) -> Self {
        self.bloom_filter_error_rate = bloom_filter_error_rate;
        self
    }

    /// Set a listener receiving every impression.
    pub fn listener(mut self, listener: impl ImpressionListener + Send + Sync + 'a) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Clock used by optimized mode to tell which hour it is, in epoch milliseconds.
    ///
    /// Defaults to the system clock.
    pub fn clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Create a new [`ImpressionsManager`] using this configuration.
    ///
    /// Fails if a size is zero or the error rate is not between 0 and 1.
    pub fn to_manager(self) -> Result<ImpressionsManager<'a>> {
        ImpressionsManager::new(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::{impressions::ImpressionsMode, Error, ImpressionsConfig};

    #[test]
    fn rejects_invalid_sizes() {
        let result = ImpressionsConfig::new(ImpressionsMode::Optimized)
            .observer_cache_size(0)
            .to_manager();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = ImpressionsConfig::new(ImpressionsMode::None)
            .bloom_filter_error_rate(1.5)
            .to_manager();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn none_mode_needs_no_observer() {
        let manager = ImpressionsConfig::new(ImpressionsMode::None)
            .observer_cache_size(0)
            .to_manager()
            .unwrap();
        assert_eq!(manager.mode(), ImpressionsMode::None);
    }
}
