use crate::types::errors::TimeOfDayError;
use chrono::{NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const SECONDS_PER_MINUTE: u32 = 60;
const SECONDS_PER_HOUR: u32 = 60 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: u32 = 24 * SECONDS_PER_HOUR;

/// A point within a day, stored as seconds since midnight.
///
/// Unlike `NaiveTime` this can represent `24:00:00`, which lets a half-open
/// window `[start, end)` cover the last second of the day.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(SECONDS_PER_DAY);

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, TimeOfDayError> {
        if hour > 24 || minute >= 60 || second >= 60 {
            return Err(TimeOfDayError::OutOfRange(format!("{hour:02}:{minute:02}:{second:02}")));
        }

        let seconds = hour * SECONDS_PER_HOUR + minute * SECONDS_PER_MINUTE + second;

        if seconds > SECONDS_PER_DAY {
            return Err(TimeOfDayError::OutOfRange(format!("{hour:02}:{minute:02}:{second:02}")));
        }

        Ok(TimeOfDay(seconds))
    }

    pub fn seconds(&self) -> u32 {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0 / SECONDS_PER_HOUR
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        TimeOfDay(time.num_seconds_from_midnight())
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let hour = self.hour();
        let minute = (self.seconds() % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
        let second = self.seconds() % SECONDS_PER_MINUTE;
        write!(formatter, "{hour:02}:{minute:02}:{second:02}")
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    /// Accepts `HH:MM` or `HH:MM:SS`; `24:00` is the end of the day.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(TimeOfDayError::InvalidFormat("Value is an empty string".to_string()));
        }

        let parts: Vec<&str> = value.split(':').collect();

        if parts.len() < 2 || parts.len() > 3 {
            return Err(TimeOfDayError::InvalidFormat(format!("Expected HH:MM or HH:MM:SS but found [{value}]")));
        }

        if parts.iter().any(|part| part.is_empty() || !part.chars().all(|c| c.is_ascii_digit())) {
            return Err(TimeOfDayError::InvalidFormat(format!("Value [{value}] contains a non-numeric component")));
        }

        let hour: u32 = parts[0].parse()?;
        let minute: u32 = parts[1].parse()?;
        let second: u32 = match parts.get(2) {
            Some(part) => part.parse()?,
            None => 0
        };

        TimeOfDay::from_hms(hour, minute, second)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        TimeOfDay::from_str(&value).map_err(de::Error::custom)
    }
}
