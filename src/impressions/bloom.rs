use std::f64::consts::LN_2;

use crate::{hash::murmur3_128, Error, Result};

/// A Bloom filter over strings.
///
/// Sized for `max_elements` insertions at a false positive rate of `error_rate`. Bit positions
/// are derived from a single murmur3 x64_128 hash by double hashing.
///
/// Not synchronized: mutation requires `&mut self`.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    max_elements: usize,
    error_rate: f64,
}

impl BloomFilter {
    /// Create an empty filter.
    ///
    /// The filter has `ceil(-n ln p / ln²2)` bits and `ceil(m/n ln 2)` hash functions.
    pub fn new(max_elements: usize, error_rate: f64) -> Result<BloomFilter> {
        if max_elements == 0 {
            return Err(Error::InvalidConfig("bloom filter capacity must be positive"));
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(Error::InvalidConfig(
                "bloom filter error rate must be between 0 and 1",
            ));
        }

        let n = max_elements as f64;
        let num_bits = (-n * error_rate.ln() / (LN_2 * LN_2)).ceil() as u64;
        let num_hashes = ((num_bits as f64 / n) * LN_2).ceil().max(1.0) as u32;

        Ok(BloomFilter {
            bits: vec![0; words_for(num_bits)],
            num_bits,
            num_hashes,
            max_elements,
            error_rate,
        })
    }

    /// Insert `item`.
    pub fn add(&mut self, item: &str) {
        let (h0, h1) = murmur3_128(item.as_bytes(), 0);
        for i in 1..=self.num_hashes {
            let bit = self.bit_index(h0, h1, i);
            self.bits[(bit >> 6) as usize] |= 1 << (bit & 63);
        }
    }

    /// Return `true` if `item` may have been inserted, `false` if it definitely wasn't.
    pub fn contains(&self, item: &str) -> bool {
        let (h0, h1) = murmur3_128(item.as_bytes(), 0);
        (1..=self.num_hashes).all(|i| {
            let bit = self.bit_index(h0, h1, i);
            self.bits[(bit >> 6) as usize] & (1 << (bit & 63)) != 0
        })
    }

    /// Forget all insertions.
    pub fn clear(&mut self) {
        self.bits = vec![0; words_for(self.num_bits)];
    }

    /// Number of bits in the filter.
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Number of hash functions.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Number of insertions the filter was sized for.
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Target false positive rate.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Kirsch-Mitzenmacher: `(h0 + i * h1) % m`, with `i` starting at 1.
    fn bit_index(&self, h0: u64, h1: u64, i: u32) -> u64 {
        h0.wrapping_add(u64::from(i).wrapping_mul(h1)) % self.num_bits
    }
}

fn words_for(num_bits: u64) -> usize {
    num_bits.div_ceil(64) as usize
}
