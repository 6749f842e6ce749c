//! Serde helpers for configuration values

/// Durations written as seconds
///
/// Serializes whole seconds as an integer and anything finer as a float, and
/// accepts either form back, so `connect_timeout = 10` and
/// `connect_timeout = 2.5` are both valid TOML.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Timeouts {
///     #[serde(with = "hu_core::config::serde_utils::duration_secs")]
///     connect: Duration,
/// }
/// ```
pub mod duration_secs {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(duration.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Seconds {
            Whole(u64),
            Fractional(f64),
        }

        match Seconds::deserialize(deserializer)? {
            Seconds::Whole(secs) => Ok(Duration::from_secs(secs)),
            Seconds::Fractional(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| D::Error::custom(format!("invalid duration: {} seconds", secs))),
        }
    }
}
