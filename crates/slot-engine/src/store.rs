//! Collaborator seams and the bundled in-memory store.
//!
//! The engine talks to persistence through narrow traits so the read path
//! can be backed by anything that answers range queries. The write-path
//! trait carries the one hard requirement of the whole system:
//! [`ReservationStore::insert_if_no_overlap`] must be atomic per resource.

use chrono_tz::Tz;
use dashmap::DashMap;

use crate::booking::{Reservation, ReservationStatus};
use crate::busy::BusyInterval;
use crate::error::{InsertError, StoreError, UpdateError};
use crate::interval::Interval;
use crate::schedule::{BreakWindow, ServicePolicy, WeeklySchedule};

/// Internal reservation persistence.
pub trait ReservationStore: Send + Sync {
    /// All reservations for `resource_id` whose interval overlaps `window`,
    /// regardless of status. The aggregator filters on status itself.
    fn reservations_overlapping(
        &self,
        resource_id: &str,
        window: &Interval,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Insert `reservation` unless a `Pending`/`Confirmed` reservation on
    /// the same resource overlaps its interval. The check and the write MUST
    /// be atomic with respect to concurrent inserts on the same resource —
    /// this is where "a slot is granted to at most one caller" is enforced.
    fn insert_if_no_overlap(&self, reservation: Reservation) -> Result<String, InsertError>;

    fn get(&self, reservation_id: &str) -> Result<Option<Reservation>, StoreError>;

    /// Apply a status transition, enforcing
    /// [`ReservationStatus::can_transition_to`].
    fn update_status(
        &self,
        reservation_id: &str,
        next: ReservationStatus,
    ) -> Result<Reservation, UpdateError>;
}

/// One externally synced calendar source. Populated by an out-of-band sync
/// job; the engine only ever reads a snapshot and never triggers a live
/// provider call inline with slot computation.
pub trait ExternalBusyFeed: Send + Sync {
    /// Short identifier used in logs, e.g. "google-work".
    fn name(&self) -> &str;

    fn busy_intervals(
        &self,
        resource_id: &str,
        window: &Interval,
    ) -> Result<Vec<BusyInterval>, StoreError>;
}

/// Per-resource configuration reads. `Ok(None)` means "not configured" and
/// resolves to a documented default, never an error.
pub trait ResourceConfig: Send + Sync {
    fn timezone(&self, resource_id: &str) -> Result<Option<Tz>, StoreError>;
    fn weekly_schedule(&self, resource_id: &str) -> Result<Option<WeeklySchedule>, StoreError>;
    fn break_windows(&self, resource_id: &str) -> Result<Vec<BreakWindow>, StoreError>;
    fn service_policy(&self, resource_id: &str) -> Result<Option<ServicePolicy>, StoreError>;
}

/// In-memory reservation store keyed by resource id.
///
/// The map entry guard doubles as the per-resource advisory lock: it is held
/// across the overlap check and the push, so no other writer can slip a
/// conflicting row in between.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    by_resource: DashMap<String, Vec<Reservation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reservation without the overlap guard. Bootstrap/test
    /// helper for loading previously persisted rows.
    pub fn seed(&self, reservation: Reservation) {
        self.by_resource
            .entry(reservation.resource_id.clone())
            .or_default()
            .push(reservation);
    }
}

impl ReservationStore for InMemoryStore {
    fn reservations_overlapping(
        &self,
        resource_id: &str,
        window: &Interval,
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .by_resource
            .get(resource_id)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.interval.overlaps(window))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert_if_no_overlap(&self, reservation: Reservation) -> Result<String, InsertError> {
        let mut rows = self
            .by_resource
            .entry(reservation.resource_id.clone())
            .or_default();
        if let Some(existing) = rows
            .iter()
            .find(|r| r.status.blocks_availability() && r.interval.overlaps(&reservation.interval))
        {
            return Err(InsertError::Conflict {
                existing_id: existing.id.clone(),
            });
        }
        let id = reservation.id.clone();
        rows.push(reservation);
        Ok(id)
    }

    fn get(&self, reservation_id: &str) -> Result<Option<Reservation>, StoreError> {
        Ok(self.by_resource.iter().find_map(|entry| {
            entry
                .value()
                .iter()
                .find(|r| r.id == reservation_id)
                .cloned()
        }))
    }

    fn update_status(
        &self,
        reservation_id: &str,
        next: ReservationStatus,
    ) -> Result<Reservation, UpdateError> {
        for mut entry in self.by_resource.iter_mut() {
            if let Some(row) = entry
                .value_mut()
                .iter_mut()
                .find(|r| r.id == reservation_id)
            {
                if !row.status.can_transition_to(next) {
                    return Err(UpdateError::IllegalTransition {
                        from: row.status,
                        to: next,
                    });
                }
                row.status = next;
                return Ok(row.clone());
            }
        }
        Err(UpdateError::NotFound(reservation_id.to_string()))
    }
}

/// Static per-resource configuration.
#[derive(Debug, Default)]
pub struct InMemoryConfig {
    entries: DashMap<String, ResourceEntry>,
}

/// Configuration for one resource. Unset fields resolve to defaults.
#[derive(Debug, Clone, Default)]
pub struct ResourceEntry {
    pub timezone: Option<Tz>,
    pub schedule: Option<WeeklySchedule>,
    pub breaks: Vec<BreakWindow>,
    pub policy: Option<ServicePolicy>,
}

impl InMemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, resource_id: impl Into<String>, entry: ResourceEntry) {
        self.entries.insert(resource_id.into(), entry);
    }
}

impl ResourceConfig for InMemoryConfig {
    fn timezone(&self, resource_id: &str) -> Result<Option<Tz>, StoreError> {
        Ok(self.entries.get(resource_id).and_then(|e| e.timezone))
    }

    fn weekly_schedule(&self, resource_id: &str) -> Result<Option<WeeklySchedule>, StoreError> {
        Ok(self
            .entries
            .get(resource_id)
            .and_then(|e| e.schedule.clone()))
    }

    fn break_windows(&self, resource_id: &str) -> Result<Vec<BreakWindow>, StoreError> {
        Ok(self
            .entries
            .get(resource_id)
            .map(|e| e.breaks.clone())
            .unwrap_or_default())
    }

    fn service_policy(&self, resource_id: &str) -> Result<Option<ServicePolicy>, StoreError> {
        Ok(self.entries.get(resource_id).and_then(|e| e.policy))
    }
}

/// A fixed set of externally synced busy rows, as left behind by a sync job.
#[derive(Debug, Default)]
pub struct StaticBusyFeed {
    name: String,
    rows: Vec<(String, BusyInterval)>,
}

impl StaticBusyFeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, resource_id: impl Into<String>, busy: BusyInterval) {
        self.rows.push((resource_id.into(), busy));
    }
}

impl ExternalBusyFeed for StaticBusyFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn busy_intervals(
        &self,
        resource_id: &str,
        window: &Interval,
    ) -> Result<Vec<BusyInterval>, StoreError> {
        Ok(self
            .rows
            .iter()
            .filter(|(rid, busy)| rid == resource_id && busy.interval.overlaps(window))
            .map(|(_, busy)| busy.clone())
            .collect())
    }
}
