//! Transport encoding of cache values.
//!
//! Values are stored inside a tagged envelope so that decoding is a variant
//! dispatch, never a parse-attempt heuristic: a cached string `"42"` comes
//! back as the string `"42"`, not the number 42.

use recache_core::RecacheResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage envelope. Strings travel as `scalar`, everything else as `json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
enum Envelope {
    Scalar(String),
    Json(Value),
}

/// Encodes a value into its transport string.
pub fn encode<T: Serialize>(value: &T) -> RecacheResult<String> {
    let envelope = match serde_json::to_value(value)? {
        Value::String(s) => Envelope::Scalar(s),
        other => Envelope::Json(other),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a transport string produced by [`encode`].
pub fn decode<T: DeserializeOwned>(raw: &str) -> RecacheResult<T> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    let value = match envelope {
        Envelope::Scalar(s) => Value::String(s),
        Envelope::Json(v) => v,
    };
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn round_trip<T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug>(value: T) {
        let encoded = encode(&value).unwrap();
        let decoded: T = decode(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_round_trip_scalars() {
        round_trip(42i64);
        round_trip(3.5f64);
        round_trip(true);
        round_trip("hello".to_string());
        round_trip(Option::<i64>::None);
    }

    #[test]
    fn test_round_trip_json_looking_strings() {
        // The tagged envelope keeps these as strings; the original
        // parse-attempt heuristic would have turned them into numbers,
        // booleans, or objects.
        round_trip("42".to_string());
        round_trip("true".to_string());
        round_trip("{\"id\": 7}".to_string());
        round_trip("[1, 2, 3]".to_string());
        round_trip("null".to_string());
    }

    #[test]
    fn test_round_trip_sequences_and_mappings() {
        round_trip(vec![1, 2, 3]);
        round_trip(vec!["a".to_string(), "b".to_string()]);

        let mut map = BTreeMap::new();
        map.insert("id".to_string(), 7i64);
        map.insert("views".to_string(), 100i64);
        round_trip(map);
    }

    #[test]
    fn test_round_trip_struct() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct User {
            id: i64,
            name: String,
            tags: Vec<String>,
        }
        round_trip(User {
            id: 7,
            name: "x".to_string(),
            tags: vec!["admin".to_string()],
        });
    }

    #[test]
    fn test_envelope_shape() {
        let encoded = encode(&"plain").unwrap();
        assert!(encoded.contains("\"kind\":\"scalar\""));

        let encoded = encode(&vec![1, 2]).unwrap();
        assert!(encoded.contains("\"kind\":\"json\""));
    }

    #[test]
    fn test_decode_rejects_untagged_payload() {
        assert!(decode::<i64>("42").is_err());
        assert!(decode::<String>("not json at all").is_err());
    }

    #[test]
    fn test_decode_type_mismatch_is_error() {
        let encoded = encode(&vec![1, 2]).unwrap();
        let err = decode::<String>(&encoded).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
