//! `slots` CLI — inspect availability and book slots against a JSON state
//! file.
//!
//! ## Usage
//!
//! ```sh
//! # Print the slot table for a resource and date
//! slots availability -s state.json --resource studio-1 --date 2026-08-11
//!
//! # Same, as JSON, with a 45-minute service override
//! slots availability -s state.json --resource studio-1 --date 2026-08-11 \
//!     --duration 45 --json
//!
//! # Book a window and persist the new reservation back to the file
//! slots book -s state.json --resource studio-1 --customer alice \
//!     --start 2026-08-11T09:00:00Z --end 2026-08-11T10:00:00Z \
//!     --service haircut --write
//!
//! # Cancel a reservation
//! slots cancel -s state.json --reservation <id> --write
//! ```
//!
//! All subcommands accept `--now <rfc3339>` to pin the clock, which makes
//! output reproducible in scripts and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use slot_engine::{
    BookingError, BreakWindow, BusyInterval, BusySource, Engine, InMemoryConfig, InMemoryStore,
    Interval, Reservation, ReservationStatus, ReservationStore, ResourceEntry, ServiceDetails,
    ServicePolicy, StaticBusyFeed, WeeklySchedule,
};

#[derive(Parser)]
#[command(name = "slots", version, about = "Slot availability and booking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the labelled slot table for a resource and date
    Availability {
        /// Path to the JSON state file
        #[arg(short, long)]
        state: String,
        /// Resource id to query
        #[arg(long)]
        resource: String,
        /// Date to query (YYYY-MM-DD, in the resource's zone)
        #[arg(long)]
        date: NaiveDate,
        /// Per-call service duration override in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Emit the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Pin the clock (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Book a window for a customer
    Book {
        /// Path to the JSON state file
        #[arg(short, long)]
        state: String,
        #[arg(long)]
        resource: String,
        #[arg(long)]
        customer: String,
        /// Window start (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,
        /// Window end (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,
        /// Name of the booked service
        #[arg(long)]
        service: String,
        /// Price in the currency's minor unit
        #[arg(long, default_value_t = 0)]
        price: i64,
        #[arg(long, default_value = "EUR")]
        currency: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Persist the new reservation back to the state file
        #[arg(long)]
        write: bool,
        /// Pin the clock (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Cancel a reservation
    Cancel {
        /// Path to the JSON state file
        #[arg(short, long)]
        state: String,
        /// Reservation id to cancel
        #[arg(long)]
        reservation: String,
        /// Persist the status change back to the state file
        #[arg(long)]
        write: bool,
        /// Pin the clock (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

/// The on-disk state: resource configuration, reservations, and the
/// externally synced busy cache.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    resources: BTreeMap<String, ResourceSpec>,
    #[serde(default)]
    reservations: Vec<Reservation>,
    #[serde(default)]
    external_busy: Vec<ExternalBusyRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceSpec {
    #[serde(default = "default_timezone")]
    timezone: Tz,
    #[serde(default)]
    schedule: Option<WeeklySchedule>,
    #[serde(default)]
    breaks: Vec<BreakWindow>,
    #[serde(default)]
    policy: Option<ServicePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExternalBusyRow {
    resource: String,
    #[serde(default = "default_feed")]
    feed: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    label: String,
    #[serde(default = "default_source")]
    source: BusySource,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_feed() -> String {
    "external".to_string()
}

fn default_source() -> BusySource {
    BusySource::ExternalCalendar
}

fn main() -> Result<()> {
    // Logs go to stderr so table/JSON output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Availability {
            state,
            resource,
            date,
            duration,
            json,
            now,
        } => {
            let state_file = load_state(&state)?;
            let (engine, _store) = build_engine(&state_file)?;
            let now = now.unwrap_or_else(Utc::now);

            let day = engine.available_slots(&resource, date, duration, now)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&day)?);
                return Ok(());
            }

            if day.possibly_incomplete {
                eprintln!("warning: an external calendar feed failed; busy time may be missing");
            }
            if let Some(refusal) = day.refusal {
                println!("no slots for {resource} on {date}: {}", refusal_message(refusal));
                return Ok(());
            }

            let tz = state_file
                .resources
                .get(&resource)
                .map(|spec| spec.timezone)
                .unwrap_or(Tz::UTC);
            for slot in &day.slots {
                let start = slot.interval.start.with_timezone(&tz).format("%H:%M");
                let end = slot.interval.end.with_timezone(&tz).format("%H:%M");
                match &slot.block_reason {
                    None => println!("{start}–{end}  OPEN"),
                    Some(reason) => println!("{start}–{end}  taken ({reason})"),
                }
            }
        }
        Commands::Book {
            state,
            resource,
            customer,
            start,
            end,
            service,
            price,
            currency,
            notes,
            write,
            now,
        } => {
            let mut state_file = load_state(&state)?;
            let (engine, store) = build_engine(&state_file)?;
            let now = now.unwrap_or_else(Utc::now);

            let interval = Interval::new(start, end)?;
            let details = ServiceDetails {
                service_name: service,
                price_minor_units: price,
                currency,
                notes,
            };

            let id = match engine.book(&resource, &customer, interval, details, now) {
                Ok(id) => id,
                Err(BookingError::SlotNoLongerAvailable { .. }) => {
                    bail!(
                        "slot is no longer available; re-run `slots availability` and pick another window"
                    );
                }
                Err(other) => return Err(other.into()),
            };
            println!("booked: {id}");

            if write {
                let created = store
                    .get(&id)?
                    .context("reservation vanished after insert")?;
                state_file.reservations.push(created);
                save_state(&state, &state_file)?;
            }
        }
        Commands::Cancel {
            state,
            reservation,
            write,
            now,
        } => {
            let mut state_file = load_state(&state)?;
            let (engine, _store) = build_engine(&state_file)?;
            let now = now.unwrap_or_else(Utc::now);

            let cancelled = engine.cancel(&reservation, now)?;
            println!("cancelled: {}", cancelled.id);

            if write {
                for row in &mut state_file.reservations {
                    if row.id == cancelled.id {
                        row.status = ReservationStatus::Cancelled;
                    }
                }
                save_state(&state, &state_file)?;
            }
        }
    }

    Ok(())
}

fn load_state(path: &str) -> Result<StateFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse state file: {path}"))
}

fn save_state(path: &str, state: &StateFile) -> Result<()> {
    let raw = serde_json::to_string_pretty(state)?;
    std::fs::write(path, raw).with_context(|| format!("Failed to write state file: {path}"))
}

/// Wire an engine from the loaded state: seed the store with existing
/// reservations, register resource configuration, and group the external
/// busy cache into one feed per source name.
fn build_engine(state: &StateFile) -> Result<(Engine, Arc<InMemoryStore>)> {
    let store = Arc::new(InMemoryStore::new());
    for reservation in &state.reservations {
        store.seed(reservation.clone());
    }

    let config = InMemoryConfig::new();
    for (resource_id, spec) in &state.resources {
        config.insert(
            resource_id.clone(),
            ResourceEntry {
                timezone: Some(spec.timezone),
                schedule: spec.schedule.clone(),
                breaks: spec.breaks.clone(),
                policy: spec.policy,
            },
        );
    }

    let mut feeds: BTreeMap<String, StaticBusyFeed> = BTreeMap::new();
    for row in &state.external_busy {
        let interval = Interval::new(row.start, row.end)
            .with_context(|| format!("busy row '{}' has an invalid interval", row.label))?;
        feeds
            .entry(row.feed.clone())
            .or_insert_with(|| StaticBusyFeed::new(row.feed.clone()))
            .push(
                row.resource.clone(),
                BusyInterval {
                    interval,
                    source: row.source,
                    label: row.label.clone(),
                },
            );
    }

    let mut engine = Engine::new(store.clone(), Arc::new(config));
    for (_, feed) in feeds {
        engine = engine.with_feed(Arc::new(feed));
    }
    Ok((engine, store))
}

fn refusal_message(refusal: slot_engine::RefusalReason) -> &'static str {
    use slot_engine::RefusalReason::*;
    match refusal {
        PastDate => "the date is in the past",
        BeyondBookingHorizon => "the date is beyond the advance-booking horizon",
        SameDayDisabled => "same-day booking is disabled for this resource",
        DayClosed => "the resource is closed that day",
    }
}
