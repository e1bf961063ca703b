//! Wire-format helpers shared by task records.
//!
//! The record store hands back dates in whatever form the screen that wrote
//! them produced: RFC 3339 instants, `datetime-local` values without a zone,
//! SQL-style timestamps, or bare calendar dates. All of them are normalised
//! to UTC instants so that comparisons are chronological, never lexical.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a wire date-time into a UTC instant.
///
/// Zone-less values are read as UTC and a bare date means midnight UTC.
/// Returns `None` for text that matches none of the accepted forms.
#[must_use]
pub fn parse_wire_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok());
    if let Some(value) = naive {
        return Some(value.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}

/// Serde adapter for optional wire date-times.
///
/// Absent, `null`, and empty-string values decode to `None`; anything else
/// must parse. Encoding writes RFC 3339 UTC, keeping any fraction of a
/// second, or `null`.
pub mod optional_datetime {
    use super::parse_wire_datetime;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    /// Serialises an optional instant.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => {
                serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => serializer.serialize_none(),
        }
    }

    /// Deserialises an optional instant from any accepted wire form.
    ///
    /// # Errors
    ///
    /// Returns a deserialisation error when a non-empty value cannot be
    /// parsed as a date or date-time.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => parse_wire_datetime(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date-time: {text}"))),
        }
    }
}

/// Deserialises a value where `null` means the type's default.
///
/// Combine with `#[serde(default)]` so absent fields default as well.
///
/// # Errors
///
/// Propagates errors from the inner deserialisation.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
