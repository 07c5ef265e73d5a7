//! Reservation records, the status lifecycle, and the cancellation policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl ReservationStatus {
    /// Whether a reservation in this status blocks the window it covers.
    pub fn blocks_availability(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Legal lifecycle transitions. Everything else is rejected by the store.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, NoShow)
        )
    }
}

/// What was booked and for how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub service_name: String,
    /// Price in the currency's minor unit (cents, pence, …).
    pub price_minor_units: i64,
    pub currency: String,
    #[serde(default)]
    pub notes: String,
}

/// The durable record created when a booking commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub resource_id: String,
    pub customer_id: String,
    pub interval: Interval,
    pub details: ServiceDetails,
    pub status: ReservationStatus,
}

/// Whether a reservation may still be cancelled by its customer.
///
/// Pending reservations can always be cancelled. Confirmed reservations can
/// be cancelled up to `cutoff_hours` before they start (exactly at the
/// cutoff still counts); inside the cutoff the decision belongs to the
/// provider-side management flow, which does not go through this predicate.
pub fn is_cancellable(
    status: ReservationStatus,
    starts_at: DateTime<Utc>,
    now: DateTime<Utc>,
    cutoff_hours: i64,
) -> bool {
    match status {
        ReservationStatus::Pending => true,
        ReservationStatus::Confirmed => now + Duration::hours(cutoff_hours) <= starts_at,
        _ => false,
    }
}
