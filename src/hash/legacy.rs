/// Legacy bucketing hash: Java's `String.hashCode()` over UTF-16 code units, XORed with `seed`.
///
/// All arithmetic wraps at 32 bits.
pub fn legacy_hash(key: &str, seed: i32) -> i32 {
    let h = key
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    h ^ seed
}

#[cfg(test)]
mod tests {
    use super::legacy_hash;

    #[test]
    fn matches_java_hash_code() {
        assert_eq!(legacy_hash("", 0), 0);
        assert_eq!(legacy_hash("abc", 0), 96354);
        assert_eq!(legacy_hash("hello", 0), 99162322);
        assert_eq!(
            legacy_hash("The quick brown fox jumps over the lazy dog", 0),
            -609428141
        );
    }

    #[test]
    fn applies_seed() {
        assert_eq!(legacy_hash("hello", 12345), 99166443);
        assert_eq!(legacy_hash("user-1", -1851491779), 1603227794);
    }

    #[test]
    fn hashes_utf16_code_units() {
        assert_eq!(legacy_hash("été", 7), 227737);
        // Outside of BMP: two surrogate code units.
        assert_eq!(legacy_hash("\u{1F600}", 0), 1772899);
    }
}
