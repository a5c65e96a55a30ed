//! Lenient timestamp decoding.
//!
//! The API emits `timestamptz` strings (`2024-05-01T08:30:00.123+00:00`),
//! older rows carry bare dates, and locally built records use Unix ms. All
//! of them decode to Unix milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(0),
        Some(RawTimestamp::Millis(millis)) => Ok(millis),
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {text}"))),
    }
}

/// Parse an RFC 3339 timestamp, a naive datetime (assumed UTC) or a bare
/// date (midnight UTC) into Unix milliseconds.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}
