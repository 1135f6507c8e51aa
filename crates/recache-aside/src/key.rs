//! Deterministic cache key derivation.
//!
//! Keys have the shape `{namespace}:{operation}:{digest}` where the digest
//! is a short fingerprint of the call arguments. The same namespace,
//! operation, and arguments always produce the same key.

use recache_core::RecacheResult;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Width of the argument digest, in hex characters.
const DIGEST_WIDTH: usize = 8;

/// Captured call arguments: positional values in order, keyword values by
/// name.
///
/// Arguments are converted to JSON at capture time, so a value that cannot
/// be deterministically encoded fails fast instead of producing an unstable
/// key later. Keyword names are kept sorted; insertion order never affects
/// the derived key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Serialize>(mut self, value: &T) -> RecacheResult<Self> {
        self.args.push(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Adds a keyword argument.
    pub fn kwarg<T: Serialize>(mut self, name: &str, value: &T) -> RecacheResult<Self> {
        self.kwargs
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Looks up a keyword argument by name.
    #[must_use]
    pub fn get_kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// Canonical serialization of the argument set.
    ///
    /// `serde_json`'s map type is BTree-backed, so nested objects also
    /// serialize with sorted keys and the encoding is stable.
    fn canonical(&self) -> String {
        serde_json::json!({
            "args": self.args,
            "kwargs": self.kwargs,
        })
        .to_string()
    }

    /// Short hex fingerprint of the argument set.
    #[must_use]
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.canonical().as_bytes());
        hex::encode(hash)[..DIGEST_WIDTH].to_string()
    }
}

/// Derives the cache key for one call.
///
/// The namespace segment is omitted when `namespace` is `None` or empty.
#[must_use]
pub fn build_key(namespace: Option<&str>, operation: &str, args: &CallArgs) -> String {
    let digest = args.digest();
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}:{}:{}", ns, operation, digest),
        _ => format!("{}:{}", operation, digest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_args() -> CallArgs {
        CallArgs::new()
            .arg(&1)
            .unwrap()
            .arg(&2)
            .unwrap()
            .kwarg("a", &1)
            .unwrap()
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = build_key(Some("user"), "get_user", &sample_args());
        let b = build_key(Some("user"), "get_user", &sample_args());
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_shape() {
        let key = build_key(Some("user"), "get_user", &sample_args());
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts[0], "user");
        assert_eq!(parts[1], "get_user");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_namespace_omitted_when_absent() {
        let args = sample_args();
        assert!(build_key(None, "get_user", &args).starts_with("get_user:"));
        assert!(build_key(Some(""), "get_user", &args).starts_with("get_user:"));
    }

    #[test]
    fn test_changed_argument_changes_key() {
        let base = build_key(None, "op", &sample_args());

        let different_arg = CallArgs::new().arg(&1).unwrap().arg(&3).unwrap();
        let different_kwarg = sample_args().kwarg("a", &2).unwrap();
        assert_ne!(base, build_key(None, "op", &different_arg));
        assert_ne!(base, build_key(None, "op", &different_kwarg));
    }

    #[test]
    fn test_kwarg_insertion_order_is_irrelevant() {
        let ab = CallArgs::new()
            .kwarg("a", &1)
            .unwrap()
            .kwarg("b", &2)
            .unwrap();
        let ba = CallArgs::new()
            .kwarg("b", &2)
            .unwrap()
            .kwarg("a", &1)
            .unwrap();
        assert_eq!(ab.digest(), ba.digest());
    }

    #[test]
    fn test_positional_order_matters() {
        let ab = CallArgs::new().arg(&"a").unwrap().arg(&"b").unwrap();
        let ba = CallArgs::new().arg(&"b").unwrap().arg(&"a").unwrap();
        assert_ne!(ab.digest(), ba.digest());
    }

    #[test]
    fn test_structured_arguments() {
        let mut map = BTreeMap::new();
        map.insert("status", "published");
        let args = CallArgs::new().kwarg("filter", &map).unwrap();
        let key = build_key(Some("post"), "list_posts", &args);
        assert!(key.starts_with("post:list_posts:"));
    }

    #[test]
    fn test_non_serializable_argument_fails_fast() {
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], "x");
        // Non-string map keys cannot be represented in JSON.
        let err = CallArgs::new().kwarg("m", &bad).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
