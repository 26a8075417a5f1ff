// Time helpers shared by the formats and the persisted ledger

use chrono::{NaiveDateTime, Timelike};

/// Second-resolution, timezone-naive layout used by every format.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()?;
    if parsed.nanosecond() != 0 {
        return None;
    }
    Some(parsed)
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter keeping persisted timestamps in [`TIME_FORMAT`].
pub mod local_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time '{}'", raw)))
    }
}

/// [`local_time`] for optional timestamps; `None` serializes as `null`.
pub mod local_time_opt {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S>(time: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => serializer.serialize_some(&super::format_time(time)),
            None => serializer.serialize_none(),
        }
    }
}
