//! Error types for the slot engine.
//!
//! Infrastructure failures are errors; domain-level "no availability" is
//! data (see [`crate::slots::RefusalReason`]) and never raises one.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::booking::ReservationStatus;

/// Infrastructure failure reported by a backing store or busy feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Errors surfaced by the read path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// The internal reservation store could not be queried. Fatal: the
    /// engine never claims a slot is free based on unreliable internal data.
    #[error("reservation store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors surfaced by the write path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// Another reservation or busy interval claimed the window first.
    /// Expected under contention; callers re-query and offer fresh slots.
    #[error("slot is no longer available")]
    SlotNoLongerAvailable {
        conflicting_reservation: Option<String>,
    },

    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("reservation not found: {0}")]
    NotFound(String),

    #[error("reservation cannot be cancelled (status {status:?}, starts {starts_at})")]
    NotCancellable {
        status: ReservationStatus,
        starts_at: DateTime<Utc>,
    },

    #[error("illegal status transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("reservation store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a rejected [`crate::store::ReservationStore::insert_if_no_overlap`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsertError {
    /// An existing `Pending`/`Confirmed` reservation overlaps the requested
    /// interval on the same resource.
    #[error("interval conflicts with reservation {existing_id}")]
    Conflict { existing_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a rejected [`crate::store::ReservationStore::update_status`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    #[error("reservation not found: {0}")]
    NotFound(String),

    #[error("illegal status transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
