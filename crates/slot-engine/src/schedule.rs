//! Weekly working hours, break windows, booking policy, and per-day
//! resolution.
//!
//! Resolution combines a calendar date with the resource's weekly schedule
//! in the resource's own time zone and returns absolute UTC instants. A DST
//! fold resolves to the earlier of the two instants; a wall-clock time that
//! falls inside a spring-forward gap shifts ahead to the next instant that
//! exists in the zone.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// Opening hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub enabled: bool,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl DayHours {
    pub fn open_between(open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            enabled: true,
            open,
            close,
        }
    }

    pub fn closed() -> Self {
        Self {
            enabled: false,
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
        }
    }
}

/// A weekly recurring schedule, Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: [DayHours; 7],
}

impl WeeklySchedule {
    /// The entry that applies to `date`.
    pub fn entry_for(&self, date: NaiveDate) -> DayHours {
        self.days[date.weekday().num_days_from_monday() as usize]
    }

    /// Same hours Monday through Friday, weekend closed.
    pub fn weekdays(open: NaiveTime, close: NaiveTime) -> Self {
        let working = DayHours::open_between(open, close);
        Self {
            days: [
                working,
                working,
                working,
                working,
                working,
                DayHours::closed(),
                DayHours::closed(),
            ],
        }
    }
}

impl Default for WeeklySchedule {
    /// Weekdays 09:00–17:00, weekend closed. Applied whenever a resource has
    /// no stored schedule, so "no configuration" is never an error.
    fn default() -> Self {
        Self::weekdays(hm(9, 0), hm(17, 0))
    }
}

/// A recurring daily exclusion inside the open window, e.g. a lunch break.
/// Breaks are independent of one another; they may touch or overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Per-resource booking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePolicy {
    pub slot_duration_minutes: u32,
    /// Dead time inserted between consecutive slots; belongs to no slot.
    pub buffer_minutes: u32,
    /// How far into the future slots may be requested.
    pub advance_booking_days: u32,
    pub allow_same_day_booking: bool,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 60,
            buffer_minutes: 0,
            advance_booking_days: 30,
            allow_same_day_booking: true,
        }
    }
}

/// A break window anchored to a concrete date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBreak {
    pub label: String,
    pub interval: Interval,
}

/// The open window and breaks that apply to one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDay {
    /// `None` means the resource is closed that day — not an error.
    pub open: Option<Interval>,
    pub breaks: Vec<ResolvedBreak>,
}

impl ResolvedDay {
    fn closed() -> Self {
        Self {
            open: None,
            breaks: Vec::new(),
        }
    }
}

/// Resolve the applicable open window and break windows for `date`.
///
/// A disabled weekday, a malformed entry (`open >= close`), or hours that
/// cannot be anchored in `tz` all resolve as closed. Malformed breaks are
/// skipped rather than rejected.
pub fn resolve_day(
    schedule: &WeeklySchedule,
    breaks: &[BreakWindow],
    date: NaiveDate,
    tz: Tz,
) -> ResolvedDay {
    let hours = schedule.entry_for(date);
    if !hours.enabled || hours.open >= hours.close {
        return ResolvedDay::closed();
    }

    let open = match (anchor(date, hours.open, tz), anchor(date, hours.close, tz)) {
        (Some(start), Some(end)) if start < end => Interval { start, end },
        _ => return ResolvedDay::closed(),
    };

    let breaks = breaks
        .iter()
        .filter(|b| b.start < b.end)
        .filter_map(|b| {
            let start = anchor(date, b.start, tz)?;
            let end = anchor(date, b.end, tz)?;
            (start < end).then(|| ResolvedBreak {
                label: b.label.clone(),
                interval: Interval { start, end },
            })
        })
        .collect();

    ResolvedDay {
        open: Some(open),
        breaks,
    }
}

/// The full civil day `[00:00, next day 00:00)` as a UTC interval.
/// 23 or 25 hours long on DST transition days.
pub fn day_bounds(date: NaiveDate, tz: Tz) -> Option<Interval> {
    let start = anchor(date, NaiveTime::MIN, tz)?;
    let end = anchor(date.succ_opt()?, NaiveTime::MIN, tz)?;
    (start < end).then_some(Interval { start, end })
}

/// Anchor a local wall-clock time on `date` to an absolute UTC instant.
///
/// A DST fold takes the earlier of the two candidate instants. A time inside
/// a spring-forward gap advances minute by minute until it exists; the scan
/// is capped at two hours, beyond any real zone transition.
fn anchor(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    let mut local = date.and_time(time);
    for _ in 0..=120 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => return Some(earlier.with_timezone(&Utc)),
            LocalResult::None => local += Duration::minutes(1),
        }
    }
    None
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("in-range literal time")
}
