//! Serde helpers for the loosely typed scalars found in SEC XML.
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::Error};
use std::str::FromStr;

/// Deserializes a string into a u64, tolerating surrounding whitespace and
/// leading zeros (`0001000045`).
pub fn deserialize_str_to_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    u64::from_str(s.trim()).map_err(Error::custom)
}

/// Deserializes `1`/`0`/`true`/`false` flags. Empty text is `false`.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.trim() {
        "1" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "false" | "FALSE" | "False" | "" => Ok(false),
        other => Err(Error::custom(format!("invalid flag: {:?}", other))),
    }
}

/// Deserializes a number; empty text is `0.0`, anything else must parse.
pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.trim() {
        "" => Ok(0.0),
        s => f64::from_str(s).map_err(Error::custom),
    }
}

/// Deserializes a number, falling back to `0.0` for empty or malformed text
/// (prices are sometimes reported as `N/A` or with stray symbols).
pub fn deserialize_robust_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(f64::from_str(s.trim()).unwrap_or(0.0))
}

/// Deserializes a `YYYY-MM-DD` date. A trailing timezone offset
/// (`2018-10-15-05:00`) is ignored.
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();
    let date = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(Error::custom)
}
