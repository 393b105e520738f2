//! Session expiry normalization. Sessions written by different pages and
//! backend versions encode expiry as ISO-8601 text, SQL `DATETIME` text, or
//! Unix epoch seconds, or omit it altogether. Everything funnels through
//! [`parse_expiry`], which never reports a value it cannot read as expired.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

/// How a raw expiry value is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpiryFormat {
    Absent,
    Iso8601,
    SqlDateTime,
    EpochSeconds,
    Unrecognized,
}

/// A normalized expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// No usable expiry; the session never lapses on its own.
    Persistent,
    At(DateTime<Utc>),
}

impl Expiry {
    /// Whether a session with this expiry is still usable at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Persistent => true,
            Self::At(instant) => now < *instant,
        }
    }

    #[must_use]
    pub const fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Persistent => None,
            Self::At(instant) => Some(*instant),
        }
    }
}

fn is_sql_datetime(value: &str) -> bool {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").map_or(false, |re| re.is_match(value))
}

fn is_epoch_seconds(value: &str) -> bool {
    Regex::new(r"^-?\d+(\.\d+)?$").map_or(false, |re| re.is_match(value))
}

/// Classifies a raw expiry value. Empty strings, `null`, `false` and `0` are
/// absent, matching how the web pages treat falsy expiry fields.
#[must_use]
pub fn classify(raw: Option<&Value>) -> ExpiryFormat {
    match raw {
        None | Some(Value::Null | Value::Bool(false)) => ExpiryFormat::Absent,
        Some(Value::Number(number)) => {
            if number.as_f64() == Some(0.0) {
                ExpiryFormat::Absent
            } else {
                ExpiryFormat::EpochSeconds
            }
        }
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                ExpiryFormat::Absent
            } else if is_sql_datetime(text) {
                ExpiryFormat::SqlDateTime
            } else if is_epoch_seconds(text) {
                ExpiryFormat::EpochSeconds
            } else {
                ExpiryFormat::Iso8601
            }
        }
        Some(_) => ExpiryFormat::Unrecognized,
    }
}

/// Normalizes any supported expiry representation. Values that cannot be read
/// are treated as [`Expiry::Persistent`].
///
/// A JSON number is read as epoch seconds, the same as an all-digit string.
/// Browser pages that hand a bare number to `new Date(n)` read it as epoch
/// milliseconds instead, so a record written that way by a page expires far
/// later here than it would there.
#[must_use]
pub fn parse_expiry(raw: Option<&Value>) -> Expiry {
    let instant = match classify(raw) {
        ExpiryFormat::Absent | ExpiryFormat::Unrecognized => None,
        ExpiryFormat::Iso8601 => raw.and_then(Value::as_str).and_then(parse_iso8601),
        ExpiryFormat::SqlDateTime => raw.and_then(Value::as_str).and_then(parse_sql_datetime),
        ExpiryFormat::EpochSeconds => raw.and_then(epoch_seconds).and_then(from_epoch_seconds),
    };

    instant.map_or(Expiry::Persistent, Expiry::At)
}

fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    // offset-less values are read as UTC
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

fn parse_sql_datetime(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|datetime| datetime.and_utc())
}

fn epoch_seconds(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}
