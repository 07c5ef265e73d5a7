//! Slot generation — walking an open window in duration+buffer steps and
//! labelling every candidate against busy time and breaks.
//!
//! Blocked candidates are emitted, not filtered: the caller renders "this
//! slot is taken" instead of silently losing slots. Given identical inputs
//! the output is identical; there are no clock reads here.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::busy::BusySnapshot;
use crate::interval::Interval;
use crate::schedule::{ResolvedBreak, ServicePolicy};

/// One candidate window, available or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub interval: Interval,
    pub duration_minutes: u32,
    pub available: bool,
    /// Why the slot is blocked: a busy interval's label or a break's label.
    pub block_reason: Option<String>,
}

/// Why a day produced no candidates at all. Returned as data so the caller
/// can render a helpful message; never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalReason {
    PastDate,
    BeyondBookingHorizon,
    SameDayDisabled,
    DayClosed,
}

/// The read-path result for one resource and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub resource_id: String,
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    pub refusal: Option<RefusalReason>,
    /// `true` when an external busy feed failed and the result may be
    /// missing blocked time.
    pub possibly_incomplete: bool,
}

impl DayAvailability {
    pub(crate) fn refused(resource_id: &str, date: NaiveDate, refusal: RefusalReason) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            date,
            slots: Vec::new(),
            refusal: Some(refusal),
            possibly_incomplete: false,
        }
    }
}

/// Generate the labelled slot sequence for an open window.
///
/// Candidates are `[t, t + duration)` starting at `open.start`, advancing by
/// `duration + buffer` while the candidate still fits inside the window.
/// Buffer time is dead space belonging to no slot. A candidate is blocked if
/// it overlaps any busy interval or any resolved break; the first matching
/// label is surfaced (precedence between the two groups is not significant).
pub fn generate_slots(
    open: &Interval,
    breaks: &[ResolvedBreak],
    busy: &BusySnapshot,
    policy: &ServicePolicy,
    duration_override: Option<u32>,
) -> Vec<Slot> {
    let duration_minutes = duration_override.unwrap_or(policy.slot_duration_minutes);
    if duration_minutes == 0 {
        return Vec::new();
    }
    let duration = Duration::minutes(i64::from(duration_minutes));
    let step = duration + Duration::minutes(i64::from(policy.buffer_minutes));

    let mut slots = Vec::new();
    let mut t = open.start;
    while t + duration <= open.end {
        let candidate = Interval {
            start: t,
            end: t + duration,
        };
        let block_reason = busy
            .blocking(&candidate)
            .map(|b| b.label.clone())
            .or_else(|| {
                breaks
                    .iter()
                    .find(|b| b.interval.overlaps(&candidate))
                    .map(|b| b.label.clone())
            });
        slots.push(Slot {
            interval: candidate,
            duration_minutes,
            available: block_reason.is_none(),
            block_reason,
        });
        t += step;
    }
    slots
}
