//! Human-friendly TTL strings.
//!
//! Accepted forms: plain seconds (`"90"`) or anything [`humantime`] reads,
//! such as `"15m"`, `"7d"`, `"2w"` or `"1h30m"`. A leading `-` negates the
//! whole value.

use chrono::Duration;
use thiserror::Error;

/// Errors produced by [`parse_duration`].
#[derive(Debug, Error)]
pub enum ParseDurationError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid duration '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("duration '{0}' is out of range")]
    Overflow(String),
}

/// Parse a duration string into a [`chrono::Duration`].
pub fn parse_duration(input: &str) -> Result<Duration, ParseDurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };

    let overflow = || ParseDurationError::Overflow(input.to_string());

    let total = if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = body.parse().map_err(|_| overflow())?;
        Duration::try_seconds(secs).ok_or_else(overflow)?
    } else {
        let std = humantime::parse_duration(body).map_err(|source| ParseDurationError::Invalid {
            input: input.to_string(),
            source,
        })?;
        Duration::from_std(std).map_err(|_| overflow())?
    };

    Ok(if negative { -total } else { total })
}

/// Render a duration in the compact form accepted by [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.num_seconds();
    if secs == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if secs < 0 {
        out.push('-');
        secs = -secs;
    }

    for (unit, size) in [('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)] {
        let count = secs / size;
        if count > 0 {
            out.push_str(&format!("{count}{unit}"));
            secs %= size;
        }
    }
    out
}

/// Serde adapter for TTL fields: writes compact strings, reads strings or
/// integer seconds.
pub mod serde_ttl {
    use super::{format_duration, parse_duration};
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => {
                Duration::try_seconds(secs).ok_or_else(|| de::Error::custom("ttl is out of range"))
            }
            Raw::Text(text) => parse_duration(&text).map_err(de::Error::custom),
        }
    }
}
