//! MurmurHash3, x86 32-bit and x64 128-bit variants.

const C1_32: u32 = 0xcc9e2d51;
const C2_32: u32 = 0x1b873593;

const C1_128: u64 = 0x87c37b91114253d5;
const C2_128: u64 = 0x4cf5ad432745937f;

/// MurmurHash3 x86 32-bit.
pub fn murmur3_32(key: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut blocks = key.chunks_exact(4);
    for block in &mut blocks {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= mix_k_32(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let k = tail
            .iter()
            .enumerate()
            .fold(0u32, |k, (i, byte)| k | u32::from(*byte) << (8 * i));
        h ^= mix_k_32(k);
    }

    h ^= key.len() as u32;
    fmix32(h)
}

/// MurmurHash3 x64 128-bit.
///
/// Returns `(low, high)` 64-bit halves. The low half is the first word of the canonical output
/// and is what impression hashing consumes.
pub fn murmur3_128(key: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;

    let mut blocks = key.chunks_exact(16);
    for block in &mut blocks {
        let k1 = read_u64_le(&block[..8]);
        let k2 = read_u64_le(&block[8..]);

        h1 ^= mix_k1_128(k1);
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dce729);

        h2 ^= mix_k2_128(k2);
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x38495ab5);
    }

    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2_128(read_u64_le(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1_128(read_u64_le(&tail[..tail.len().min(8)]));
    }

    let len = key.len() as u64;
    h1 ^= len;
    h2 ^= len;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

#[inline]
fn mix_k_32(k: u32) -> u32 {
    k.wrapping_mul(C1_32).rotate_left(15).wrapping_mul(C2_32)
}

#[inline]
fn mix_k1_128(k1: u64) -> u64 {
    k1.wrapping_mul(C1_128).rotate_left(31).wrapping_mul(C2_128)
}

#[inline]
fn mix_k2_128(k2: u64) -> u64 {
    k2.wrapping_mul(C2_128).rotate_left(33).wrapping_mul(C1_128)
}

/// Read up to 8 bytes as a little-endian integer, zero-padding the missing high bytes.
#[inline]
fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^ (h >> 16)
}

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::{murmur3_128, murmur3_32};

    #[test]
    fn murmur3_32_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514e28b7);
        assert_eq!(murmur3_32(b"", 0xffffffff), 0x81f16f39);
        assert_eq!(murmur3_32(b"test", 0), 0xba6bd213);
        assert_eq!(murmur3_32(b"abcd", 0), 0x43ed676a);
    }

    #[test]
    fn murmur3_32_tail_lengths() {
        let seed = 0x9747b28c;
        assert_eq!(murmur3_32(b"a", seed), 0x7fa09ea6);
        assert_eq!(murmur3_32(b"aa", seed), 0x5d211726);
        assert_eq!(murmur3_32(b"aaa", seed), 0x283e0130);
        assert_eq!(murmur3_32(b"aaaa", seed), 0x5a97808a);
        assert_eq!(murmur3_32(b"abcd", seed), 0xf0478627);
        assert_eq!(murmur3_32(b"Hello, world!", seed), 0x24884cba);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", seed),
            0x2fa826cd
        );
    }

    #[test]
    fn murmur3_128_reference_vectors() {
        assert_eq!(murmur3_128(b"", 0), (0, 0));
        assert_eq!(
            murmur3_128(b"hello", 0),
            (0xcbd8a7b341bd9b02, 0x5b1e906a48ae1d19)
        );
        // remainder > 8
        assert_eq!(
            murmur3_128(b"The quick brown fox jumps over the lazy dog", 0),
            (0xe34bbc7bbc071b6c, 0x7a433ca9c49a9347)
        );
        assert_eq!(
            murmur3_128(b"The quick brown fox jumps over the lazy dog.", 0),
            (0xcd99481f9ee902c9, 0x695da1a38987b6e7)
        );
        // one full block plus a single tail byte
        assert_eq!(
            murmur3_128(b"abcdefghijklmnopq", 0),
            (0x7564747f88bda657, 0xecda499da1110de4)
        );
    }
}
