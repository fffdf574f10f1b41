//! Content checksums used for change detection

use sha2::{Digest, Sha256};

/// Computes the hex-encoded SHA-256 of the UTF-8 bytes of `text`
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(digest("Hello"), digest("Hello"));
        assert_eq!(
            digest("Hello"),
            "185f8db32271fe25f561a6fc938b2e264306ec304eda518007d1764826381969"
        );
    }

    #[test]
    fn test_empty_text_has_digest() {
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_text_different_digest() {
        assert_ne!(digest("Hello"), digest("Hello World"));
        assert_eq!(digest("Hello World").len(), 64);
    }
}
