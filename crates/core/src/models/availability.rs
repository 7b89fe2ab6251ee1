use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};

/// Minutes since local midnight, `00:00..=24:00`.
///
/// `24:00` is representable so that a rule can run to the end of its day;
/// it is only valid as an end bound. On the wire this is an `HH:MM` string,
/// always interpreted against the owning profile's IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(24 * 60);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= 24 * 60).then_some(TimeOfDay(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid HH:MM time: {0:?}")]
pub struct ParseTimeOfDayError(String);

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeOfDayError(s.to_string());
        let (hours, minutes) = s.split_once(':').ok_or_else(err)?;
        if hours.len() != 2 || minutes.len() != 2 {
            return Err(err());
        }
        let hours: u16 = hours.parse().map_err(|_| err())?;
        let minutes: u16 = minutes.parse().map_err(|_| err())?;
        if minutes > 59 {
            return Err(err());
        }
        TimeOfDay::from_minutes(hours * 60 + minutes).ok_or_else(err)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One recurring interval within a week, in the profile's timezone.
///
/// `day_of_week` runs `0` (Sunday) through `6` (Saturday). Overlapping
/// available rules are unioned at resolution time; blackout rules
/// (`is_available = false`) subtract from the union and win on ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRule {
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub is_available: bool,
}

impl WeeklyRule {
    pub fn validate(&self) -> EngineResult<()> {
        if self.day_of_week > 6 {
            return Err(EngineError::validation(
                "day_of_week",
                format!(
                    "must be 0 (Sunday) through 6 (Saturday), got {}",
                    self.day_of_week
                ),
            ));
        }
        validate_window(self.start_time, self.end_time)
    }
}

/// A date-specific exception that fully supersedes weekly coverage for its
/// date. `is_available = false` blocks the whole date; `is_available = true`
/// with explicit bounds makes exactly that sub-range offerable (never merged
/// with the weekly pattern); `is_available = true` without bounds opens the
/// whole date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub date: NaiveDate,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DateOverride {
    pub fn validate(&self) -> EngineResult<()> {
        match (self.start_time, self.end_time) {
            (None, None) => Ok(()),
            (Some(start), Some(end)) => validate_window(start, end),
            _ => Err(EngineError::validation(
                "start_time",
                "start_time and end_time must be provided together",
            )),
        }
    }
}

fn validate_window(start: TimeOfDay, end: TimeOfDay) -> EngineResult<()> {
    if start >= end {
        return Err(EngineError::validation(
            "start_time",
            format!("start {start} must be before end {end}"),
        ));
    }
    Ok(())
}

/// Parse an IANA timezone id, surfacing failures as field-level validation.
pub fn parse_timezone(timezone: &str) -> EngineResult<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| EngineError::validation("timezone", format!("unknown IANA timezone {timezone:?}")))
}

/// A mentor's canonical bookable time: weekly pattern, date overrides, and
/// the timezone both are declared in. Owned 1:1 by the mentor; soft-disabled
/// via `is_active` rather than deleted while bookings reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityProfile {
    pub mentor_id: Uuid,
    pub timezone: String,
    pub weekly_rules: Vec<WeeklyRule>,
    pub date_overrides: BTreeMap<NaiveDate, DateOverride>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityProfile {
    pub fn new(mentor_id: Uuid, timezone: String, now: DateTime<Utc>) -> Self {
        AvailabilityProfile {
            mentor_id,
            timezone,
            weekly_rules: Vec::new(),
            date_overrides: BTreeMap::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tz(&self) -> EngineResult<Tz> {
        parse_timezone(&self.timezone)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetWeeklyRulesRequest {
    /// Required when the request creates the profile, optional afterwards
    #[serde(default)]
    pub timezone: Option<String>,
    pub rules: Vec<WeeklyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetProfileActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityProfileResponse {
    pub mentor_id: Uuid,
    pub timezone: String,
    pub is_active: bool,
    pub weekly_rules: Vec<WeeklyRule>,
    pub date_overrides: Vec<DateOverride>,
    pub updated_at: DateTime<Utc>,
}

impl From<AvailabilityProfile> for AvailabilityProfileResponse {
    fn from(profile: AvailabilityProfile) -> Self {
        AvailabilityProfileResponse {
            mentor_id: profile.mentor_id,
            timezone: profile.timezone,
            is_active: profile.is_active,
            weekly_rules: profile.weekly_rules,
            date_overrides: profile.date_overrides.into_values().collect(),
            updated_at: profile.updated_at,
        }
    }
}
