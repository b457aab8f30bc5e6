//! Serde helpers shared by the document models.

/// RFC 3339 UTC timestamps with fixed millisecond precision
/// (`2024-05-01T12:00:00.000Z`).
///
/// Every stored timestamp has the same width, so ordering the strings orders
/// the instants.
pub mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::rfc3339_millis;
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Stamped {
        #[serde(with = "rfc3339_millis")]
        at: chrono::DateTime<Utc>,
    }

    #[test]
    fn test_fixed_width_output() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_string(&Stamped { at }).unwrap();
        assert_eq!(json, r#"{"at":"2024-05-01T12:00:00.000Z"}"#);
    }

    #[test]
    fn test_accepts_offsets() {
        let parsed: Stamped = serde_json::from_str(r#"{"at":"2024-05-01T14:00:00+02:00"}"#).unwrap();
        assert_eq!(parsed.at, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }
}
