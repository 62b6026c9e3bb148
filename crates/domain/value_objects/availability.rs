use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::{bookings::BookedSlotEntity, sports_fields::SportsFieldEntity},
    value_objects::{
        enums::activities::Activity,
        time_slots::{parse_day, parse_time_of_day},
    },
};

pub const DEFAULT_DURATION_HOURS: u32 = 1;
pub const MAX_DURATION_HOURS: u32 = 12;

/// Raw `GET /facilities` query string. Everything stays a string so a bad
/// value can degrade to an empty listing instead of a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilityQuery {
    pub activity: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedFilter {
    #[error("unknown activity: {0}")]
    Activity(String),
    #[error("invalid date filter: {0}")]
    Date(String),
    #[error("invalid time filter: {0}")]
    Time(String),
    #[error("invalid duration filter: {0}")]
    Duration(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityFilter {
    pub activity: Option<Activity>,
    pub location: Option<String>,
    pub window: SearchWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_hours: u32,
}

/// Storage-side narrowing of the booked slots a search has to look at. Every
/// bound is optional and an empty query loads everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookedSlotQuery {
    pub day: Option<NaiveDate>,
    pub not_before: Option<NaiveDate>,
    pub starts_after: Option<NaiveTime>,
    pub starts_at_or_before: Option<NaiveTime>,
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self {
            date: None,
            time: None,
            duration_hours: DEFAULT_DURATION_HOURS,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AvailabilityFilter {
    pub fn parse(query: &FacilityQuery) -> Result<Self, MalformedFilter> {
        let activity = non_empty(&query.activity)
            .map(|raw| Activity::from_str(raw).ok_or_else(|| MalformedFilter::Activity(raw.into())))
            .transpose()?;

        let date = non_empty(&query.date)
            .map(|raw| parse_day(raw).ok_or_else(|| MalformedFilter::Date(raw.into())))
            .transpose()?;

        let time = non_empty(&query.time)
            .map(|raw| parse_time_of_day(raw).ok_or_else(|| MalformedFilter::Time(raw.into())))
            .transpose()?;

        let duration_hours = match non_empty(&query.duration) {
            None => DEFAULT_DURATION_HOURS,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|hours| (1..=MAX_DURATION_HOURS).contains(hours))
                .ok_or_else(|| MalformedFilter::Duration(raw.into()))?,
        };

        Ok(Self {
            activity,
            location: non_empty(&query.location).map(str::to_string),
            window: SearchWindow {
                date,
                time,
                duration_hours,
            },
        })
    }
}

impl SearchWindow {
    pub fn is_unbounded(&self) -> bool {
        self.date.is_none() && self.time.is_none()
    }

    /// Bounds for loading only the bookings that can conflict with this
    /// window. Without a date the search covers `today` onward.
    ///
    /// `Q` in `[T, T + D)` is the same as `T` in `(Q - D, Q]`, so the time
    /// bounds go straight to storage.
    pub fn booked_slot_query(&self, today: NaiveDate) -> BookedSlotQuery {
        let (starts_after, starts_at_or_before) = match self.time {
            Some(query_time) => {
                let earliest = i64::from(query_time.num_seconds_from_midnight())
                    - i64::from(self.duration_hours) * 3600;
                let starts_after = u32::try_from(earliest)
                    .ok()
                    .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0));
                (starts_after, Some(query_time))
            }
            None => (None, None),
        };

        BookedSlotQuery {
            day: self.date,
            not_before: if self.date.is_none() { Some(today) } else { None },
            starts_after,
            starts_at_or_before,
        }
    }

    /// A booking starting at `T` blocks query time `Q` iff `Q` is in
    /// `[T, T + duration)`. With only a date, any booking that day blocks.
    /// Intervals are same-day: a late booking never blocks early hours of the
    /// following day.
    pub fn conflicts_with(&self, booked: &BookedSlotEntity) -> bool {
        if let Some(date) = self.date {
            if booked.day != date {
                return false;
            }
        }

        match self.time {
            Some(query_time) => interval_contains(booked.time, self.duration_hours, query_time),
            None => self.date.is_some(),
        }
    }
}

fn interval_contains(start: NaiveTime, duration_hours: u32, query: NaiveTime) -> bool {
    let start = i64::from(start.num_seconds_from_midnight());
    let end = start + i64::from(duration_hours) * 3600;
    let query = i64::from(query.num_seconds_from_midnight());
    start <= query && query < end
}

/// Search mode of the conflict resolver: drops every field with at least one
/// booking that overlaps `window`. Input order is preserved.
pub fn available_fields(
    fields: Vec<SportsFieldEntity>,
    booked: &[BookedSlotEntity],
    window: &SearchWindow,
) -> Vec<SportsFieldEntity> {
    if window.is_unbounded() {
        return fields;
    }

    let blocked: HashSet<Uuid> = booked
        .iter()
        .filter(|slot| window.conflicts_with(slot))
        .map(|slot| slot.field_id)
        .collect();

    fields
        .into_iter()
        .filter(|field| !blocked.contains(&field.id))
        .collect()
}
