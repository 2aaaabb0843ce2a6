//! Timestamps are stored as Unix seconds so that one row mapping works on
//! every supported database; they are rendered as RFC 3339 in JSON.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Current time in Unix seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

pub fn to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Start of the calendar month containing `at`, and of the month before it.
pub fn month_bounds(at: DateTime<Utc>) -> (i64, i64) {
    let current = Utc
        .with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(at);
    let (year, month) = if at.month() == 1 {
        (at.year() - 1, 12)
    } else {
        (at.year(), at.month() - 1)
    };
    let previous = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(current);
    (current.timestamp(), previous.timestamp())
}

/// `#[serde(with = "rfc3339")]` for `i64` Unix-second fields.
pub mod rfc3339 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(secs: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_datetime(*secs).to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        chrono::DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.timestamp())
            .map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "rfc3339_option")]` for `Option<i64>` Unix-second fields.
pub mod rfc3339_option {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(secs: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match secs {
            Some(secs) => serializer.serialize_some(&super::to_datetime(*secs).to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|raw| {
            chrono::DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.timestamp())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
