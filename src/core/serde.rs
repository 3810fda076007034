use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Serializes Duration as seconds
pub fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    duration.as_secs_f64().serialize(serializer)
}

/// Deserializes Duration from seconds
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Test {
        #[serde(serialize_with = "serialize_duration")]
        #[serde(deserialize_with = "deserialize_duration")]
        timeout: Duration,
    }

    #[test]
    fn test_duration_serialization() {
        let original = Test {
            timeout: Duration::from_millis(250),
        };

        let serialized = serde_json::to_string(&original).unwrap();
        assert_eq!(serialized, r#"{"timeout":0.25}"#);
        let deserialized: Test = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.timeout, original.timeout);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let result: std::result::Result<Test, _> = serde_json::from_str(r#"{"timeout":-1.0}"#);
        assert!(result.is_err());
    }
}
