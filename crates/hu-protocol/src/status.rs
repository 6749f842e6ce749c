//! Status payload schema
//!
//! The `data` field of a `status` envelope is itself a JSON document. Every
//! field is optional on the wire; defaults are applied by the status model,
//! not here. Numeric fields are accepted either as JSON numbers or as numeric
//! strings because the device's serializer has emitted both.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Raw fields of one status update, exactly as the device sent them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,

    /// Battery charge in [0, 1]
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::float"
    )]
    pub device_battery: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_block: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::count"
    )]
    pub current_trial: Option<u32>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::count"
    )]
    pub total_trials: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixation_required: Option<bool>,
}

impl StatusFields {
    /// Parse the JSON-encoded `data` string of a status envelope
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Encode as the JSON string carried in a status envelope
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Float {
        Number(f64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Float>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Float::Number(n)) => Ok(Some(n)),
            Some(Float::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a number, got {:?}", s))),
        }
    }

    pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Count>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Count::Number(n)) => Ok(Some(n)),
            Some(Count::Text(s)) => s.trim().parse().map(Some).map_err(|_| {
                de::Error::custom(format!("expected a non-negative integer, got {:?}", s))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_has_no_fields() {
        let fields = StatusFields::from_json("{}").unwrap();
        assert_eq!(fields, StatusFields::default());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let fields = StatusFields::from_json(
            r#"{"current_trial":"3","total_trials":"10","device_battery":"0.5"}"#,
        )
        .unwrap();
        assert_eq!(fields.current_trial, Some(3));
        assert_eq!(fields.total_trials, Some(10));
        assert_eq!(fields.device_battery, Some(0.5));
    }

    #[test]
    fn test_null_is_treated_as_missing() {
        let fields = StatusFields::from_json(r#"{"device_name":null,"total_trials":null}"#).unwrap();
        assert_eq!(fields.device_name, None);
        assert_eq!(fields.total_trials, None);
    }

    #[test]
    fn test_negative_trial_is_rejected() {
        assert!(StatusFields::from_json(r#"{"current_trial":-1}"#).is_err());
        assert!(StatusFields::from_json(r#"{"total_trials":"many"}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let fields = StatusFields::from_json(r#"{"headset_fps":72,"active_block":"B2"}"#).unwrap();
        assert_eq!(fields.active_block.as_deref(), Some("B2"));
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let fields = StatusFields {
            current_trial: Some(1),
            ..Default::default()
        };
        assert_eq!(fields.to_json().unwrap(), r#"{"current_trial":1}"#);
    }
}
