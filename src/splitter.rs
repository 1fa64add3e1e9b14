//! Bucketing: deterministic assignment of keys to partitions.
use crate::{hash::HashAlgorithm, labels, models::Partition, Str};

/// Bucket of `key` under `seed`, in `1..=100`.
pub fn get_bucket(key: &str, seed: i32, algo: HashAlgorithm) -> u8 {
    // abs() can't overflow: hashes are i32 or u32 widened to i64.
    (algo.hash(key, seed).abs() % 100 + 1) as u8
}

/// Treatment of the partition `key` falls into.
///
/// Returns `control` if there are no partitions or the partitions don't cover the key's bucket.
pub fn get_treatment(key: &str, seed: i32, partitions: &[Partition], algo: HashAlgorithm) -> Str {
    match partitions {
        [] => labels::CONTROL.into(),
        [single] if single.size >= 100 => single.treatment.clone(),
        _ => {
            let bucket = u32::from(get_bucket(key, seed, algo));
            let mut covered = 0u32;
            partitions
                .iter()
                .find(|partition| {
                    covered = covered.saturating_add(partition.size);
                    covered >= bucket
                })
                .map(|partition| partition.treatment.clone())
                .unwrap_or_else(|| labels::CONTROL.into())
        }
    }
}
