use crate::config::KeyStrategy;

/// Derive the cache key for a raw input.
///
/// With [`KeyStrategy::Prefix`] the key is the first `prefix_len` characters (or the
/// whole input when shorter). It is a heuristic fingerprint: long inputs that share a
/// prefix map to the same key.
pub fn fingerprint(raw: &str, strategy: KeyStrategy, prefix_len: usize) -> String {
    match strategy {
        KeyStrategy::Content => raw.to_string(),
        KeyStrategy::Prefix => match raw.char_indices().nth(prefix_len) {
            Some((end, _)) => raw[..end].to_string(),
            None => raw.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_its_own_key() {
        assert_eq!(fingerprint("abc", KeyStrategy::Prefix, 100), "abc");
    }

    #[test]
    fn long_input_is_truncated_to_prefix() {
        let raw = "x".repeat(250);
        assert_eq!(fingerprint(&raw, KeyStrategy::Prefix, 100).len(), 100);
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let raw = "스킬".repeat(80);
        let key = fingerprint(&raw, KeyStrategy::Prefix, 100);
        assert_eq!(key.chars().count(), 100);
        assert!(raw.starts_with(&key));
    }

    #[test]
    fn shared_prefix_collides_only_with_prefix_strategy() {
        let base = "H".repeat(100);
        let a = format!("{base}a");
        let b = format!("{base}b");

        assert_eq!(
            fingerprint(&a, KeyStrategy::Prefix, 100),
            fingerprint(&b, KeyStrategy::Prefix, 100)
        );
        assert_ne!(
            fingerprint(&a, KeyStrategy::Content, 100),
            fingerprint(&b, KeyStrategy::Content, 100)
        );
    }
}
