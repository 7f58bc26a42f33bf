// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp encoding shared by both storage backends and the sync snapshot.
//!
//! Timestamps are written as RFC 3339 with millisecond precision in UTC
//! (`2026-03-01T12:00:00.000Z`). Parsing also accepts the bare SQL form
//! `2026-03-01 12:00:00`, read as UTC, which older exports contain. Parsed
//! values are truncated to milliseconds so every backend compares the same
//! instants.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::StrongboxError;

const SQL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current instant, truncated to the precision timestamps are stored at.
pub fn now() -> DateTime<Utc> {
    truncate(Utc::now())
}

/// Drop precision below one millisecond.
pub fn truncate(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// Format an instant in the canonical stored form.
pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp, accepting RFC 3339 or the SQL form.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, StrongboxError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(truncate(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, SQL_FORMAT)
        .map(|naive| truncate(naive.and_utc()))
        .map_err(|e| StrongboxError::Serialization(format!("invalid timestamp `{raw}`: {e}")))
}

/// Serde adapter for `DateTime<Utc>` fields.
pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(at))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        at: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serializer.serialize_some(&super::format(at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_uses_millis_and_z_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format(&at), "2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn parse_accepts_sql_form_as_utc() {
        let parsed = parse("2026-03-01 12:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let parsed = parse("2026-03-01T14:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn parse_truncates_to_millis() {
        let parsed = parse("2026-03-01T12:00:00.0005Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(
            parse("2026-03-01T12:00:00.123999Z").unwrap(),
            parse("2026-03-01T12:00:00.123Z").unwrap()
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("yesterday").is_err());
    }

    #[test]
    fn now_survives_format_and_parse() {
        let at = now();
        assert_eq!(parse(&format(&at)).unwrap(), at);
    }
}
