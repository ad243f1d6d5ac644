//! Serde helpers for the backend's loosely typed fields.
//!
//! The backend stores rows in SQLite and serializes them as-is, so timestamps
//! arrive as `YYYY-MM-DD HH:MM:SS` and booleans sometimes arrive as `0`/`1`.

/// Timestamp parsing for `created_at`-style fields.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    /// Parse a timestamp in any of the formats the backend or the static
    /// testimonial data use. Naive values are taken as UTC.
    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc())
    }

    /// `Option<DateTime<Utc>>` codec. Missing, null or unparseable values
    /// decode as `None`; present values encode as RFC 3339.
    pub mod option {
        use super::{DateTime, Deserialize, Deserializer, Serializer, Utc};

        /// Decode a lenient optional timestamp.
        ///
        /// # Errors
        ///
        /// Only fails if the value is neither a string nor null.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            Ok(raw.as_deref().and_then(super::parse))
        }

        /// Encode an optional timestamp as RFC 3339 or null.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        #[allow(clippy::ref_option)] // signature required by `serialize_with`
        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(at) => serializer.serialize_str(&at.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Boolean fields the backend may send as `true`/`false` or `1`/`0`.
pub mod flag {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    /// Decode a boolean that may be an integer; null decodes as `false`.
    ///
    /// # Errors
    ///
    /// Fails if the value is neither a boolean, an integer nor null.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Bool(value)) => value,
            Some(Raw::Int(value)) => value != 0,
            None => false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;

    use super::*;

    #[test]
    fn test_parse_sqlite_timestamp() {
        let parsed = timestamp::parse("2024-09-15 10:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 9, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_and_plain_date() {
        let parsed = timestamp::parse("2024-09-15T12:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 9, 15, 10, 30, 0).unwrap());

        let parsed = timestamp::parse("2024-05-30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap());

        assert!(timestamp::parse("last tuesday").is_none());
    }

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, with = "timestamp::option")]
        created_at: Option<chrono::DateTime<Utc>>,
        #[serde(default, deserialize_with = "flag::deserialize")]
        replied: bool,
    }

    #[test]
    fn test_lenient_row_fields() {
        let row: Row = serde_json::from_str(r#"{"created_at": "garbage", "replied": 1}"#).unwrap();
        assert!(row.created_at.is_none());
        assert!(row.replied);

        let row: Row = serde_json::from_str(r#"{"created_at": null, "replied": null}"#).unwrap();
        assert!(row.created_at.is_none());
        assert!(!row.replied);

        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(!row.replied);
    }
}
