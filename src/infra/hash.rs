use std::hash::Hasher;

use twox_hash::XxHash64;

/// Fingerprint of a raw diff text, used to skip rebuilding models when the
/// input has not changed.
pub fn hash64(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        assert_eq!(hash64("diff --git a/f b/f"), hash64("diff --git a/f b/f"));
        assert_ne!(hash64("a"), hash64("b"));
    }
}
