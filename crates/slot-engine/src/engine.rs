//! The engine façade — wires the calendar resolver, busy aggregation, and
//! slot generation into the read path, and guards the write path behind the
//! store's atomic insert.
//!
//! The read path is pure and lock-free; any number of callers may compute
//! slots concurrently. The write path re-validates against current state and
//! then lets the store decide — a caller's claim that it "saw the slot free"
//! is never trusted.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};
use uuid::Uuid;

use crate::booking::{is_cancellable, Reservation, ReservationStatus, ServiceDetails};
use crate::busy::collect_busy;
use crate::error::{BookingError, EngineError, InsertError, UpdateError};
use crate::interval::Interval;
use crate::schedule::{day_bounds, resolve_day, ServicePolicy};
use crate::slots::{generate_slots, DayAvailability, RefusalReason};
use crate::store::{ExternalBusyFeed, ReservationStore, ResourceConfig};

pub const DEFAULT_CANCELLATION_CUTOFF_HOURS: i64 = 24;

/// The slot availability engine.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn ReservationStore>,
    config: Arc<dyn ResourceConfig>,
    feeds: Vec<Arc<dyn ExternalBusyFeed>>,
    cancellation_cutoff_hours: i64,
}

impl Engine {
    pub fn new(store: Arc<dyn ReservationStore>, config: Arc<dyn ResourceConfig>) -> Self {
        Self {
            store,
            config,
            feeds: Vec::new(),
            cancellation_cutoff_hours: DEFAULT_CANCELLATION_CUTOFF_HOURS,
        }
    }

    /// Register an external busy feed. Feeds are queried in registration
    /// order on every availability query and every booking attempt.
    pub fn with_feed(mut self, feed: Arc<dyn ExternalBusyFeed>) -> Self {
        self.feeds.push(feed);
        self
    }

    pub fn with_cancellation_cutoff_hours(mut self, hours: i64) -> Self {
        self.cancellation_cutoff_hours = hours;
        self
    }

    /// The read path: the labelled slot sequence for `resource_id` on
    /// `date`.
    ///
    /// `now` is the only clock input; it drives the past/horizon/same-day
    /// gate and nothing else, so repeated calls with the same arguments and
    /// unchanged stores return identical output. Missing configuration at
    /// any level resolves to defaults (UTC, weekday 09:00–17:00 hours,
    /// 60-minute slots) rather than an error.
    pub fn available_slots(
        &self,
        resource_id: &str,
        date: NaiveDate,
        duration_override: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<DayAvailability, EngineError> {
        let tz = self.config.timezone(resource_id)?.unwrap_or(Tz::UTC);
        let policy = self.config.service_policy(resource_id)?.unwrap_or_default();
        let schedule = self
            .config
            .weekly_schedule(resource_id)?
            .unwrap_or_default();
        let breaks = self.config.break_windows(resource_id)?;

        let today = now.with_timezone(&tz).date_naive();
        if let Some(refusal) = date_gate(date, today, &policy) {
            return Ok(DayAvailability::refused(resource_id, date, refusal));
        }

        let resolved = resolve_day(&schedule, &breaks, date, tz);
        let (Some(open), Some(window)) = (resolved.open, day_bounds(date, tz)) else {
            return Ok(DayAvailability::refused(
                resource_id,
                date,
                RefusalReason::DayClosed,
            ));
        };

        let busy = collect_busy(self.store.as_ref(), &self.feeds, resource_id, &window)?;
        let slots = generate_slots(&open, &resolved.breaks, &busy, &policy, duration_override);

        Ok(DayAvailability {
            resource_id: resource_id.to_string(),
            date,
            slots,
            refusal: None,
            possibly_incomplete: !busy.complete,
        })
    }

    /// The write path: claim `interval` for `customer_id`.
    ///
    /// Busy time is re-aggregated over the requested interval immediately
    /// before the write; external-calendar busy time blocks a booking
    /// exactly as it blocks a slot. The store's atomic insert has the final
    /// say, so two concurrent calls for overlapping intervals on one
    /// resource cannot both succeed.
    pub fn book(
        &self,
        resource_id: &str,
        customer_id: &str,
        interval: Interval,
        details: ServiceDetails,
        now: DateTime<Utc>,
    ) -> Result<String, BookingError> {
        if interval.start >= interval.end {
            return Err(BookingError::InvalidInterval(format!(
                "start {} is not before end {}",
                interval.start, interval.end
            )));
        }
        if interval.end <= now {
            return Err(BookingError::InvalidInterval(
                "interval has already ended".to_string(),
            ));
        }

        let busy = collect_busy(self.store.as_ref(), &self.feeds, resource_id, &interval)?;
        if let Some(hit) = busy.blocking(&interval) {
            debug!(resource_id, blocked_by = %hit.label, "booking rejected by pre-write check");
            return Err(BookingError::SlotNoLongerAvailable {
                conflicting_reservation: None,
            });
        }

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            resource_id: resource_id.to_string(),
            customer_id: customer_id.to_string(),
            interval,
            details,
            status: ReservationStatus::Pending,
        };
        match self.store.insert_if_no_overlap(reservation) {
            Ok(id) => {
                info!(resource_id, reservation = %id, "reservation created");
                Ok(id)
            }
            Err(InsertError::Conflict { existing_id }) => {
                debug!(resource_id, existing = %existing_id, "booking lost the race");
                Err(BookingError::SlotNoLongerAvailable {
                    conflicting_reservation: Some(existing_id),
                })
            }
            Err(InsertError::Store(e)) => Err(BookingError::Store(e)),
        }
    }

    /// Customer-initiated cancellation, gated by [`is_cancellable`] with
    /// this engine's cutoff.
    pub fn cancel(
        &self,
        reservation_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, BookingError> {
        let reservation = self
            .store
            .get(reservation_id)?
            .ok_or_else(|| BookingError::NotFound(reservation_id.to_string()))?;

        if !is_cancellable(
            reservation.status,
            reservation.interval.start,
            now,
            self.cancellation_cutoff_hours,
        ) {
            return Err(BookingError::NotCancellable {
                status: reservation.status,
                starts_at: reservation.interval.start,
            });
        }

        match self
            .store
            .update_status(reservation_id, ReservationStatus::Cancelled)
        {
            Ok(cancelled) => {
                info!(reservation = reservation_id, "reservation cancelled");
                Ok(cancelled)
            }
            // The status can change between the read and the update; a
            // transition rejection here is the same "too late" answer.
            Err(UpdateError::IllegalTransition { from, .. }) => Err(BookingError::NotCancellable {
                status: from,
                starts_at: reservation.interval.start,
            }),
            Err(UpdateError::NotFound(id)) => Err(BookingError::NotFound(id)),
            Err(UpdateError::Store(e)) => Err(BookingError::Store(e)),
        }
    }

    /// Provider-side confirmation of a pending reservation.
    pub fn confirm(&self, reservation_id: &str) -> Result<Reservation, BookingError> {
        match self
            .store
            .update_status(reservation_id, ReservationStatus::Confirmed)
        {
            Ok(confirmed) => Ok(confirmed),
            Err(UpdateError::NotFound(id)) => Err(BookingError::NotFound(id)),
            Err(UpdateError::IllegalTransition { from, to }) => {
                Err(BookingError::IllegalTransition { from, to })
            }
            Err(UpdateError::Store(e)) => Err(BookingError::Store(e)),
        }
    }

    pub fn reservation(&self, reservation_id: &str) -> Result<Option<Reservation>, BookingError> {
        Ok(self.store.get(reservation_id)?)
    }
}

/// The past/horizon/same-day gate, evaluated against the resource's local
/// calendar date.
fn date_gate(date: NaiveDate, today: NaiveDate, policy: &ServicePolicy) -> Option<RefusalReason> {
    if date < today {
        return Some(RefusalReason::PastDate);
    }
    let horizon = today + Days::new(u64::from(policy.advance_booking_days));
    if date > horizon {
        return Some(RefusalReason::BeyondBookingHorizon);
    }
    if date == today && !policy.allow_same_day_booking {
        return Some(RefusalReason::SameDayDisabled);
    }
    None
}
