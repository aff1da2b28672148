//! Unique token generation for boundaries and content IDs.
//!
//! Tokens only need to be unique, not secret. They must not collide across
//! messages composed concurrently in the same process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique tokens.
pub trait TokenSource: Send + Sync {
    /// Returns a new token. Tokens consist of `[0-9a-f]` only.
    fn next_token(&self) -> String;
}

/// Token generator combining a random seed with a monotonic counter.
///
/// Each instance draws a random 64-bit seed on creation, so two instances
/// produce disjoint token streams with overwhelming probability while a
/// single instance never repeats itself.
#[derive(Debug)]
pub struct UniqueTokens {
    seed: u64,
    counter: AtomicU64,
}

impl UniqueTokens {
    /// Creates a generator with a fresh random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Creates a generator with a fixed seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for UniqueTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for UniqueTokens {
    fn next_token(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{:016x}{n:08x}", self.seed)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_fixed_seed_format() {
        let tokens = UniqueTokens::with_seed(0xabc);
        assert_eq!(tokens.next_token(), "0000000000000abc00000000");
        assert_eq!(tokens.next_token(), "0000000000000abc00000001");
    }

    #[test]
    fn test_hex_only() {
        let tokens = UniqueTokens::new();
        let token = tokens.next_token();
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_uniqueness() {
        let tokens = UniqueTokens::new();
        let mut seen = HashSet::new();
        for _ in 0..10000 {
            let token = tokens.next_token();
            assert!(seen.insert(token), "duplicate token generated");
        }
    }

    #[test]
    fn test_separate_instances_differ() {
        let a = UniqueTokens::new();
        let b = UniqueTokens::new();
        assert_ne!(a.next_token(), b.next_token());
    }

    #[test]
    fn test_concurrent_uniqueness() {
        let tokens = Arc::new(UniqueTokens::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tokens = Arc::clone(&tokens);
                std::thread::spawn(move || {
                    (0..1000).map(|_| tokens.next_token()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token), "duplicate token across threads");
            }
        }
    }
}
