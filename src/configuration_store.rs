use std::sync::{Arc, RwLock};

use crate::Configuration;

/// `ConfigurationStore` provides a Sync storage for flag configuration that allows concurrent
/// access for readers and writers.
///
/// Readers get an `Arc` snapshot. Replacing the configuration never affects evaluations already
/// holding the previous one.
#[derive(Default)]
pub struct ConfigurationStore {
    configuration: RwLock<Option<Arc<Configuration>>>,
}

impl ConfigurationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current configuration, if one was set.
    pub fn get_configuration(&self) -> Option<Arc<Configuration>> {
        // self.configuration.read() should always return Ok(). Err() is possible only if the lock
        // is poisoned (writer panicked while holding the lock), which should never happen. Still,
        // using .ok()? here to not crash the app.
        let configuration = self.configuration.read().ok()?;
        configuration.clone()
    }

    /// Set new configuration, returning the previous one.
    pub fn set_configuration(&self, configuration: Configuration) -> Option<Arc<Configuration>> {
        // Constructing new value before requesting the lock to minimize lock span.
        let new_value = Some(Arc::new(configuration));

        let mut configuration_slot = self.configuration.write().ok()?;
        std::mem::replace(&mut configuration_slot, new_value)
    }
}
