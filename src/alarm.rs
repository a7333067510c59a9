use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{Datelike, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::validation;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WakeTimeParseError {
    #[error("wake time must look like H:MM or HH:MM, got {0:?}")]
    InvalidFormat(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DaysOfWeekError {
    #[error("at least one day of week is required")]
    Empty,
    #[error("day of week must be in 0..=6 (0 = Sunday), got {0}")]
    OutOfRange(u8),
}

/// Local wall-clock time of day the alarm rings at. Always whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WakeTime(NaiveTime);

impl WakeTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Will never fail.");
        Self(normalized_time)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl FromStr for WakeTime {
    type Err = WakeTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WakeTimeParseError::InvalidFormat(s.to_string());
        if !validation::is_valid_time_format(s) {
            return Err(invalid());
        }

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;

        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for WakeTime {
    type Error = WakeTimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WakeTime> for String {
    fn from(value: WakeTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WakeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Weekdays the alarm may fire on, numbered 0 = Sunday .. 6 = Saturday.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct DaysOfWeek(BTreeSet<u8>);

impl DaysOfWeek {
    pub fn new(days: impl IntoIterator<Item = u8>) -> Result<Self, DaysOfWeekError> {
        let days = days
            .into_iter()
            .map(|day| {
                if day <= 6 {
                    Ok(day)
                } else {
                    Err(DaysOfWeekError::OutOfRange(day))
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        if days.is_empty() {
            return Err(DaysOfWeekError::Empty);
        }

        Ok(Self(days))
    }

    /// Monday through Friday.
    pub fn weekdays() -> Self {
        Self((1..=5).collect())
    }

    pub fn every_day() -> Self {
        Self((0..=6).collect())
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0.contains(&(weekday.num_days_from_sunday() as u8))
    }

    pub fn contains_date(&self, date: &impl Datelike) -> bool {
        self.contains(date.weekday())
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<Vec<u8>> for DaysOfWeek {
    type Error = DaysOfWeekError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DaysOfWeek> for Vec<u8> {
    fn from(value: DaysOfWeek) -> Self {
        value.0.into_iter().collect()
    }
}

pub const MIN_SUNRISE_MINUTES: u32 = 1;
pub const MAX_SUNRISE_MINUTES: u32 = 60;

/// The single persisted alarm. Only [`crate::validation`] should build one
/// from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmConfig {
    pub enabled: bool,
    pub wake_time: WakeTime,
    /// Minutes the sunrise ramp runs before the alarm, 1..=60.
    pub duration: u32,
    pub days_of_week: DaysOfWeek,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            wake_time: WakeTime::from_hm(7, 0).expect("07:00 is a valid time"),
            duration: 30,
            days_of_week: DaysOfWeek::weekdays(),
        }
    }
}
