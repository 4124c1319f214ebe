pub mod auth;
pub mod employee;
pub mod notification;
pub mod objective;
pub mod task;

/// Lenient timestamp parsing for backend rows.
///
/// The backend mixes RFC 3339 (`2024-05-01T09:30:00+00:00`) with naive
/// `datetime.isoformat()` output (`2024-05-01T09:30:00.123456`), which is UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// `Option<DateTime<Utc>>` from a string, `null`, or a missing field
    /// (pair with `#[serde(default)]`). Unparseable strings become `None`.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{Datelike, Timelike};

        #[test]
        fn test_parses_rfc3339_and_naive() {
            let a = parse("2024-05-01T09:30:00+02:00").unwrap();
            assert_eq!(a.hour(), 7);

            let b = parse("2024-05-01T09:30:00.123456").unwrap();
            assert_eq!(b.hour(), 9);
            assert_eq!(b.day(), 1);

            let c = parse("2024-05-01").unwrap();
            assert_eq!(c.hour(), 0);
        }

        #[test]
        fn test_rejects_garbage() {
            assert!(parse("").is_none());
            assert!(parse("yesterday").is_none());
        }
    }
}

/// Anything with a server-assigned string id.
pub trait Keyed {
    fn key(&self) -> &str;
}
