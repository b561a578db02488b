//! Tool-call parameters and their canonical fingerprints.
//!
//! Two calls with the same tool name and the same normalized parameters share a
//! [`Fingerprint`]. Normalization sorts object keys recursively and drops
//! object members whose value is `null`, so an agent retry that spells out an
//! optional argument as `null` still matches the original call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Named arguments of a tool call.
pub type Parameters = Map<String, Value>;

/// BLAKE3 digest identifying a `(tool name, normalized parameters)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Hex encoding of the digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell entries apart in logs.
        let hex = self.to_hex();
        write!(f, "{}", hex.get(..16).unwrap_or(&hex))
    }
}

/// Return a normalized copy of `value`.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !v.is_null()).collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        },
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compute the fingerprint of a tool call.
#[must_use]
pub fn fingerprint(tool_name: &str, parameters: &Parameters) -> Fingerprint {
    let canonical = canonicalize(&Value::Object(parameters.clone()));
    let mut hasher = blake3::Hasher::new();
    hasher.update(tool_name.trim().as_bytes());
    hasher.update(&[0]);
    // Serializing a `Value` cannot fail.
    if let Ok(bytes) = serde_json::to_vec(&canonical) {
        hasher.update(&bytes);
    }
    Fingerprint(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = params(json!({"to": "a@example.com", "subject": "hi"}));
        let b = params(json!({"subject": "hi", "to": "a@example.com"}));
        assert_eq!(fingerprint("send_email", &a), fingerprint("send_email", &b));
    }

    #[test]
    fn test_fingerprint_nested_order_and_nulls() {
        let a = params(json!({"event": {"start": 1, "end": 2}, "notes": null}));
        let b = params(json!({"event": {"end": 2, "start": 1}}));
        assert_eq!(
            fingerprint("create_event", &a),
            fingerprint("create_event", &b)
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_tools_and_values() {
        let a = params(json!({"path": "/tmp/a"}));
        let b = params(json!({"path": "/tmp/b"}));
        assert_ne!(fingerprint("delete_file", &a), fingerprint("delete_file", &b));
        assert_ne!(fingerprint("delete_file", &a), fingerprint("read_file", &a));
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = params(json!({"ids": [1, 2]}));
        let b = params(json!({"ids": [2, 1]}));
        assert_ne!(fingerprint("archive", &a), fingerprint("archive", &b));
    }

    #[test]
    fn test_fingerprint_display_is_short() {
        let fp = fingerprint("noop", &Parameters::new());
        assert_eq!(fp.to_string().len(), 16);
        assert_eq!(fp.to_hex().len(), 64);
    }
}
