use crate::{hash::murmur3_128, Result};

use super::{Impression, LruCache};

/// Remembers when each distinct impression was last seen.
///
/// Two impressions are the same if they share key, flag, treatment, label and change number.
pub struct ImpressionObserver {
    cache: LruCache<u64, i64>,
}

impl ImpressionObserver {
    /// Default number of distinct impressions remembered.
    pub const DEFAULT_CACHE_SIZE: usize = 500_000;

    /// Create an observer remembering up to `cache_size` distinct impressions.
    pub fn new(cache_size: usize) -> Result<ImpressionObserver> {
        Ok(ImpressionObserver {
            cache: LruCache::new(cache_size)?,
        })
    }

    /// Record `impression` and return a copy with `previous_time` set to the time the same
    /// impression was last seen, if it is still remembered.
    pub fn test_and_set(&self, impression: &Impression) -> Impression {
        let previous_time = self
            .cache
            .test_and_set(impression_hash(impression), impression.time);
        Impression {
            previous_time,
            ..impression.clone()
        }
    }
}

/// Identity of an impression: low half of murmur3 x64_128 over its distinguishing fields.
pub(crate) fn impression_hash(impression: &Impression) -> u64 {
    let identity = format!(
        "{}:{}:{}:{}:{}",
        impression.matching_key,
        impression.feature,
        impression.treatment,
        impression.label,
        impression.change_number
    );
    murmur3_128(identity.as_bytes(), 0).0
}
