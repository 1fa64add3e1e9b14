//! Hash functions used for bucketing and impression identity.
//!
//! Both bucketing hashes must produce the same values as every other SDK evaluating the same
//! flag definitions. Otherwise users would flip between treatments depending on which SDK served
//! them.
mod legacy;
mod murmur3;

use serde::{Deserialize, Serialize};

pub use legacy::legacy_hash;
pub use murmur3::{murmur3_128, murmur3_32};

/// Bucketing hash signature. Widened to `i64` so that callers can take `abs()` of any output
/// without overflow.
pub type HashFn = fn(&str, i32) -> i64;

/// Hash algorithm a flag is bucketed with.
///
/// Serialized as the `algo` integer of flag definitions: `1` is legacy, `2` is murmur. Missing
/// values mean legacy (older definitions did not carry the field), any other value means
/// murmur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "i64")]
pub enum HashAlgorithm {
    /// Java `String.hashCode` compatible hash.
    #[default]
    Legacy,
    /// MurmurHash3 x86 32-bit.
    Murmur,
}

impl From<Option<i64>> for HashAlgorithm {
    fn from(value: Option<i64>) -> Self {
        match value {
            None | Some(1) => HashAlgorithm::Legacy,
            Some(_) => HashAlgorithm::Murmur,
        }
    }
}

impl From<HashAlgorithm> for i64 {
    fn from(value: HashAlgorithm) -> Self {
        match value {
            HashAlgorithm::Legacy => 1,
            HashAlgorithm::Murmur => 2,
        }
    }
}

impl HashAlgorithm {
    /// Hash `key` with `seed` using this algorithm.
    pub fn hash(self, key: &str, seed: i32) -> i64 {
        get_hash_fn(self)(key, seed)
    }
}

/// Select the bucketing hash function for `algo`.
pub fn get_hash_fn(algo: HashAlgorithm) -> HashFn {
    match algo {
        HashAlgorithm::Legacy => legacy_bucketing_hash,
        HashAlgorithm::Murmur => murmur_bucketing_hash,
    }
}

fn legacy_bucketing_hash(key: &str, seed: i32) -> i64 {
    i64::from(legacy_hash(key, seed))
}

fn murmur_bucketing_hash(key: &str, seed: i32) -> i64 {
    // Seeds are stored as signed integers; murmur consumes their bit pattern.
    i64::from(murmur3_32(key.as_bytes(), seed as u32))
}
