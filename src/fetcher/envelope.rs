//! Persisted form of a fetched value

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A fetched value plus the time after which it should be refreshed
///
/// Stored as `{"value": ..., "refreshAfter": <epoch ms> | null}` under the
/// fetcher's cache key, always in a single write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedEnvelope<T> {
    /// The cached data
    pub value: T,
    /// Epoch milliseconds after which a call triggers a refresh; `None` never does
    #[serde(rename = "refreshAfter")]
    pub refresh_after: Option<i64>,
}

impl<T> CachedEnvelope<T> {
    /// Whether the envelope is due for a refresh at `now_millis`
    pub fn is_stale(&self, now_millis: i64) -> bool {
        self.refresh_after.is_some_and(|at| now_millis > at)
    }
}

impl<T: DeserializeOwned> CachedEnvelope<T> {
    /// Decodes an envelope from stored JSON
    ///
    /// Returns `None` unless `json` is an object with a `value` field that
    /// decodes as `T`. A `refreshAfter` that is not a number is treated as
    /// "never refresh".
    pub fn from_json(json: Value) -> Option<Self> {
        let Value::Object(mut fields) = json else {
            return None;
        };
        let value = serde_json::from_value(fields.remove("value")?).ok()?;
        let refresh_after = fields
            .get("refreshAfter")
            .and_then(Value::as_f64)
            .map(|ms| ms as i64);

        Some(Self {
            value,
            refresh_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_camel_case_refresh_after() {
        let envelope = CachedEnvelope {
            value: json!({"id": 1}),
            refresh_after: Some(1_700_000_000_000),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({"value": {"id": 1}, "refreshAfter": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn test_serializes_missing_refresh_as_null() {
        let envelope = CachedEnvelope {
            value: "x",
            refresh_after: None,
        };
        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(text, r#"{"value":"x","refreshAfter":null}"#);
    }

    #[test]
    fn test_from_json_reads_value_and_refresh_after() {
        let envelope: CachedEnvelope<Vec<u32>> =
            CachedEnvelope::from_json(json!({"value": [1, 2], "refreshAfter": 500})).unwrap();
        assert_eq!(envelope.value, vec![1, 2]);
        assert_eq!(envelope.refresh_after, Some(500));
    }

    #[test]
    fn test_from_json_accepts_fractional_timestamp() {
        let envelope: CachedEnvelope<u32> =
            CachedEnvelope::from_json(json!({"value": 1, "refreshAfter": 500.7})).unwrap();
        assert_eq!(envelope.refresh_after, Some(500));
    }

    #[test]
    fn test_from_json_without_refresh_after_never_goes_stale() {
        let envelope: CachedEnvelope<u32> =
            CachedEnvelope::from_json(json!({"value": 1})).unwrap();
        assert_eq!(envelope.refresh_after, None);
        assert!(!envelope.is_stale(i64::MAX));
    }

    #[test]
    fn test_from_json_rejects_non_envelopes() {
        assert!(CachedEnvelope::<u32>::from_json(json!(42)).is_none());
        assert!(CachedEnvelope::<u32>::from_json(json!([1, 2])).is_none());
        assert!(CachedEnvelope::<u32>::from_json(json!({"refreshAfter": 1})).is_none());
        assert!(CachedEnvelope::<u32>::from_json(json!({"value": "text"})).is_none());
    }

    #[test]
    fn test_value_field_may_hold_null() {
        let envelope: CachedEnvelope<Option<u32>> =
            CachedEnvelope::from_json(json!({"value": null, "refreshAfter": null})).unwrap();
        assert_eq!(envelope.value, None);
    }

    #[test]
    fn test_is_stale_only_strictly_after_deadline() {
        let envelope = CachedEnvelope {
            value: (),
            refresh_after: Some(1_000),
        };
        assert!(!envelope.is_stale(999));
        assert!(!envelope.is_stale(1_000));
        assert!(envelope.is_stale(1_001));
    }
}
