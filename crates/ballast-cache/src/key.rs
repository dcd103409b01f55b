//! Deterministic cache key derivation
//!
//! Keys are derived from a `(namespace, principal, payload)` triple as
//! `namespace:principal:digest`, where the digest is a fixed-length prefix of
//! the SHA-256 hash of the normalized payload. The principal sits in the
//! literal prefix, so results cached for one principal can never be addressed
//! by another. Payload normalization (whitespace collapsing and case folding)
//! happens before hashing so that semantically identical queries share a key.

use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Number of hex characters of the payload digest kept in a key.
pub const KEY_DIGEST_LEN: usize = 16;

/// Normalize a payload before hashing.
///
/// Collapses runs of whitespace to a single space, trims the ends, and
/// lowercases the result.
pub fn normalize_payload(payload: &str) -> String {
    payload
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Cache key for one cacheable request.
///
/// Construction is pure and deterministic: identical inputs always produce an
/// identical key. The formatted key string is computed lazily and cached.
#[derive(Debug, Clone)]
pub struct RequestKey {
    namespace: String,
    principal: String,
    digest: String,
    cached_key: OnceLock<String>,
}

impl RequestKey {
    /// Derive the key for a `(namespace, principal, payload)` triple.
    pub fn build(
        namespace: impl Into<String>,
        principal: impl Into<String>,
        payload: &str,
    ) -> Self {
        let normalized = normalize_payload(payload);
        let mut digest = hex::encode(Sha256::digest(normalized.as_bytes()));
        digest.truncate(KEY_DIGEST_LEN);

        Self {
            namespace: namespace.into(),
            principal: principal.into(),
            digest,
            cached_key: OnceLock::new(),
        }
    }

    /// Full key string, `namespace:principal:digest`.
    pub fn as_cache_key(&self) -> &str {
        self.cached_key
            .get_or_init(|| format!("{}:{}:{}", self.namespace, self.principal, self.digest))
    }

    /// Namespace component.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Principal component.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Digest component (first [`KEY_DIGEST_LEN`] hex characters).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Key prefix shared by every key of a `(namespace, principal)` pair.
    ///
    /// Used for principal-scoped invalidation of the in-process tier.
    pub fn principal_prefix(namespace: &str, principal: &str) -> String {
        format!("{namespace}:{principal}:")
    }
}

// Equality and hashing ignore the lazily cached key string.
impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.principal == other.principal
            && self.digest == other.digest
    }
}

impl Eq for RequestKey {}

impl Hash for RequestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.principal.hash(state);
        self.digest.hash(state);
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cache_key())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_format() {
        let key = RequestKey::build("retrieval-result", "u1", "reset wifi");
        assert_eq!(
            key.as_cache_key(),
            "retrieval-result:u1:af76d7e316d94a93"
        );
        assert_eq!(key.namespace(), "retrieval-result");
        assert_eq!(key.principal(), "u1");
        assert_eq!(key.digest(), "af76d7e316d94a93");
        assert_eq!(key.digest().len(), KEY_DIGEST_LEN);
    }

    #[test]
    fn test_normalization_collapses_whitespace_and_case() {
        let canonical = RequestKey::build("retrieval-result", "u1", "reset wifi");
        let messy = RequestKey::build("retrieval-result", "u1", "  Reset \t WIFI \n");
        assert_eq!(canonical, messy);
        assert_eq!(canonical.as_cache_key(), messy.as_cache_key());
    }

    #[test]
    fn test_distinct_payloads_produce_distinct_digests() {
        let a = RequestKey::build("model-response", "u1", "reset wifi");
        let b = RequestKey::build("model-response", "u1", "hello world");
        assert_eq!(b.digest(), "b94d27b9934d3e08");
        assert_ne!(a.as_cache_key(), b.as_cache_key());
    }

    #[test]
    fn test_principal_isolation() {
        let a = RequestKey::build("retrieval-result", "alice", "reset wifi");
        let b = RequestKey::build("retrieval-result", "bob", "reset wifi");
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.as_cache_key(), b.as_cache_key());

        let prefix = RequestKey::principal_prefix("retrieval-result", "alice");
        assert!(a.as_cache_key().starts_with(&prefix));
        assert!(!b.as_cache_key().starts_with(&prefix));
    }

    #[test]
    fn test_equality_ignores_cached_string() {
        let a = RequestKey::build("transcription", "u7", "meeting notes");
        let b = RequestKey::build("transcription", "u7", "meeting notes");
        // Format one of them so its lazy key is populated.
        let _ = a.as_cache_key();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display_matches_cache_key() {
        let key = RequestKey::build("quota-snapshot", "org-3", "daily usage");
        assert_eq!(key.to_string(), key.as_cache_key());
    }

    #[test]
    fn test_normalize_payload_examples() {
        assert_eq!(normalize_payload("  A  B  "), "a b");
        assert_eq!(normalize_payload("one\ttwo\nthree"), "one two three");
        assert_eq!(normalize_payload(""), "");
    }

    proptest! {
        #[test]
        fn prop_build_is_deterministic(
            ns in "[a-z-]{1,16}",
            principal in "[a-zA-Z0-9_-]{1,12}",
            payload in ".{0,64}",
        ) {
            let a = RequestKey::build(ns.clone(), principal.clone(), &payload);
            let b = RequestKey::build(ns, principal, &payload);
            prop_assert_eq!(a.as_cache_key(), b.as_cache_key());
        }

        #[test]
        fn prop_distinct_principals_never_collide(
            ns in "[a-z-]{1,16}",
            p1 in "[a-zA-Z0-9_-]{1,12}",
            p2 in "[a-zA-Z0-9_-]{1,12}",
            payload in ".{0,64}",
        ) {
            prop_assume!(p1 != p2);
            let a = RequestKey::build(ns.clone(), p1, &payload);
            let b = RequestKey::build(ns, p2, &payload);
            prop_assert_ne!(a.as_cache_key(), b.as_cache_key());
        }

        #[test]
        fn prop_normalization_is_idempotent(payload in ".{0,64}") {
            let normalized = normalize_payload(&payload);
            prop_assert_eq!(normalize_payload(&normalized), normalized);
        }
    }
}
