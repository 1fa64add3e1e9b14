use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::Str;

use super::{truncate_hour, Impression};

/// Number of impressions of a flag within one hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountPerFeature {
    /// Flag name.
    pub feature: Str,
    /// Start of the hour, in milliseconds since epoch.
    pub time_frame: i64,
    /// Number of impressions.
    pub count: u64,
}

/// Counts impressions per flag and hour.
#[derive(Default)]
pub struct Counter {
    counts: Mutex<HashMap<(Str, i64), u64>>,
}

impl Counter {
    /// Create an empty counter.
    pub fn new() -> Counter {
        Counter::default()
    }

    /// Add `inc` to the count of every impression's flag and hour.
    pub fn track(&self, impressions: &[Impression], inc: u64) {
        let mut counts = self.lock();
        for impression in impressions {
            *counts
                .entry((impression.feature.clone(), truncate_hour(impression.time)))
                .or_default() += inc;
        }
    }

    /// Take all counts, leaving the counter empty.
    pub fn pop_all(&self) -> Vec<CountPerFeature> {
        let counts = std::mem::take(&mut *self.lock());
        counts
            .into_iter()
            .map(|((feature, time_frame), count)| CountPerFeature {
                feature,
                time_frame,
                count,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(Str, i64), u64>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
