//! Parsing for human-readable duration strings like "90s" or "2m".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Parse a duration string with a `d`, `h`, `m`, or `s` suffix.
///
/// Case-insensitive, surrounding whitespace ignored.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (number, multiplier) = match s.strip_suffix(['d', 'h', 'm', 's']) {
        Some(number) => {
            let multiplier = match s.as_bytes()[s.len() - 1] {
                b'd' => 24 * 60 * 60,
                b'h' => 60 * 60,
                b'm' => 60,
                _ => 1,
            };
            (number, multiplier)
        }
        None => anyhow::bail!("duration must end with d, h, m, or s"),
    };

    let number: u64 = number.parse().context("invalid number in duration")?;
    let secs = number
        .checked_mul(multiplier)
        .context("duration is too large")?;

    Ok(Duration::from_secs(secs))
}

/// Serde deserializer for duration strings, for use with
/// `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
