//! Multi-source busy-time aggregation.
//!
//! Collects the intervals that block candidate slots for one resource and
//! window: internal reservations first, then each external feed in order.
//! Overlapping busy intervals are not merged — the generator only ever asks
//! "does this candidate overlap any of them".

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::interval::Interval;
use crate::store::{ExternalBusyFeed, ReservationStore};

/// Where a busy interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusySource {
    InternalBooking,
    ExternalCalendar,
    ManualBlock,
}

/// A candidate-blocking interval. Produced transiently per query; never
/// persisted as a unified object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub interval: Interval,
    pub source: BusySource,
    pub label: String,
}

/// Aggregated busy time for one resource and window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusySnapshot {
    pub intervals: Vec<BusyInterval>,
    /// `false` when at least one external feed failed; the snapshot may be
    /// missing busy time, and callers should say so.
    pub complete: bool,
}

impl BusySnapshot {
    /// The first busy interval overlapping `candidate`, if any.
    pub fn blocking(&self, candidate: &Interval) -> Option<&BusyInterval> {
        self.intervals.iter().find(|b| b.interval.overlaps(candidate))
    }
}

/// Collect busy time for `resource_id` within `window`.
///
/// Internal store failure is fatal — the engine must not claim a slot is
/// free based on unreliable internal data. External feed failures degrade:
/// the failing feed is logged and skipped, and `complete` is set to `false`.
pub fn collect_busy(
    store: &dyn ReservationStore,
    feeds: &[Arc<dyn ExternalBusyFeed>],
    resource_id: &str,
    window: &Interval,
) -> Result<BusySnapshot, StoreError> {
    let reservations = store.reservations_overlapping(resource_id, window)?;
    let mut intervals: Vec<BusyInterval> = reservations
        .into_iter()
        .filter(|r| r.status.blocks_availability())
        .map(|r| BusyInterval {
            interval: r.interval,
            source: BusySource::InternalBooking,
            label: format!("reservation {}", r.id),
        })
        .collect();

    let mut complete = true;
    for feed in feeds {
        match feed.busy_intervals(resource_id, window) {
            Ok(mut batch) => intervals.append(&mut batch),
            Err(err) => {
                warn!(
                    resource_id,
                    feed = feed.name(),
                    error = %err,
                    "external busy feed failed; availability may be incomplete"
                );
                complete = false;
            }
        }
    }

    Ok(BusySnapshot { intervals, complete })
}
