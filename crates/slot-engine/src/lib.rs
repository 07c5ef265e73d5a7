//! # slot-engine
//!
//! Deterministic slot availability and race-safe booking for scheduling
//! backends.
//!
//! Given a resource's weekly working hours, break windows, and booking
//! policy, plus busy time drawn from internal reservations and externally
//! synced calendars, the engine produces the labelled slot sequence for a
//! day and converts a chosen slot into a reservation without ever granting
//! the same window to two callers.
//!
//! ## Modules
//!
//! - [`interval`] — half-open time intervals and the overlap predicate
//! - [`schedule`] — weekly hours, breaks, policy, and per-day resolution
//! - [`busy`] — multi-source busy-time aggregation
//! - [`slots`] — candidate generation and availability labelling
//! - [`booking`] — reservation records, status lifecycle, cancellation policy
//! - [`store`] — collaborator traits and the bundled in-memory store
//! - [`engine`] — the façade wiring the read and write paths together
//! - [`error`] — error types

pub mod booking;
pub mod busy;
pub mod engine;
pub mod error;
pub mod interval;
pub mod schedule;
pub mod slots;
pub mod store;

pub use booking::{is_cancellable, Reservation, ReservationStatus, ServiceDetails};
pub use busy::{collect_busy, BusyInterval, BusySnapshot, BusySource};
pub use engine::Engine;
pub use error::{BookingError, EngineError, InsertError, StoreError, UpdateError};
pub use interval::Interval;
pub use schedule::{
    resolve_day, BreakWindow, DayHours, ResolvedBreak, ResolvedDay, ServicePolicy, WeeklySchedule,
};
pub use slots::{generate_slots, DayAvailability, RefusalReason, Slot};
pub use store::{
    ExternalBusyFeed, InMemoryConfig, InMemoryStore, ReservationStore, ResourceConfig,
    ResourceEntry, StaticBusyFeed,
};
