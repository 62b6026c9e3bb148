use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPENING_HOUR: u32 = 10;
pub const CLOSING_HOUR: u32 = 21;

/// One bookable hour on one day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot {
    pub day: NaiveDate,
    #[serde(with = "hour_minute")]
    pub time: NaiveTime,
}

impl TimeSlot {
    pub fn new(day: NaiveDate, time: NaiveTime) -> Self {
        Self { day, time }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("time {0} is outside 10:00-21:00 or not on a whole hour")]
pub struct InvalidTimeSlot(pub NaiveTime);

/// Accepts `t` iff `10:00 <= t <= 21:00` and `t` sits exactly on the hour.
pub fn validate_slot_time(time: NaiveTime) -> Result<(), InvalidTimeSlot> {
    let on_the_hour = time.minute() == 0 && time.second() == 0 && time.nanosecond() == 0;
    let in_window = (OPENING_HOUR..=CLOSING_HOUR).contains(&time.hour());

    if on_the_hour && in_window {
        Ok(())
    } else {
        Err(InvalidTimeSlot(time))
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Serde adapter writing `HH:MM` and reading `HH:MM` or `HH:MM:SS`.
pub mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid time of day: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn accepts_every_whole_hour_in_window() {
        for hour in OPENING_HOUR..=CLOSING_HOUR {
            assert!(validate_slot_time(hm(hour, 0)).is_ok(), "{hour}:00 rejected");
        }
    }

    #[test]
    fn rejects_hours_outside_window() {
        for hour in (0..OPENING_HOUR).chain(CLOSING_HOUR + 1..24) {
            assert_eq!(validate_slot_time(hm(hour, 0)), Err(InvalidTimeSlot(hm(hour, 0))));
        }
    }

    #[test]
    fn rejects_half_past_closing() {
        assert!(validate_slot_time(hm(21, 30)).is_err());
    }

    #[test]
    fn rejects_minutes_seconds_and_fractions() {
        assert!(validate_slot_time(hm(14, 15)).is_err());
        assert!(validate_slot_time(NaiveTime::from_hms_opt(14, 0, 1).unwrap()).is_err());
        assert!(validate_slot_time(NaiveTime::from_hms_milli_opt(14, 0, 0, 5).unwrap()).is_err());
    }

    #[test]
    fn slot_json_uses_hour_minute() {
        let slot: TimeSlot =
            serde_json::from_str(r#"{"day":"2024-06-10","time":"14:00"}"#).unwrap();
        assert_eq!(slot.day, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(slot.time, hm(14, 0));

        let with_seconds: TimeSlot =
            serde_json::from_str(r#"{"day":"2024-06-10","time":"15:00:00"}"#).unwrap();
        assert_eq!(with_seconds.time, hm(15, 0));

        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json["time"], "14:00");
    }

    #[test]
    fn garbage_time_is_a_parse_error() {
        assert!(serde_json::from_str::<TimeSlot>(r#"{"day":"2024-06-10","time":"2pm"}"#).is_err());
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_day("10/06/2024"), None);
    }
}
