//! Property-based tests for slot generation using proptest.
//!
//! These verify invariants that must hold for *any* policy and busy set,
//! not just the worked examples in `slot_tests.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::{
    generate_slots, BusyInterval, BusySnapshot, BusySource, Interval, ServicePolicy,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 10, 0, 0, 0).unwrap()
}

fn arb_policy() -> impl Strategy<Value = ServicePolicy> {
    (5u32..=120, 0u32..=45).prop_map(|(duration, buffer)| ServicePolicy {
        slot_duration_minutes: duration,
        buffer_minutes: buffer,
        advance_booking_days: 30,
        allow_same_day_booking: true,
    })
}

/// An open window starting somewhere in the morning, 1–10 hours long.
fn arb_open() -> impl Strategy<Value = Interval> {
    (0i64..=12 * 60, 60i64..=10 * 60).prop_map(|(offset, len)| Interval {
        start: base() + Duration::minutes(offset),
        end: base() + Duration::minutes(offset + len),
    })
}

/// Up to eight busy intervals scattered across the day.
fn arb_busy() -> impl Strategy<Value = BusySnapshot> {
    prop::collection::vec((0i64..=22 * 60, 5i64..=180), 0..8).prop_map(|raw| BusySnapshot {
        intervals: raw
            .into_iter()
            .enumerate()
            .map(|(i, (offset, len))| BusyInterval {
                interval: Interval {
                    start: base() + Duration::minutes(offset),
                    end: base() + Duration::minutes(offset + len),
                },
                source: BusySource::ExternalCalendar,
                label: format!("event-{i}"),
            })
            .collect(),
        complete: true,
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn every_slot_has_the_exact_requested_duration(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        for slot in &slots {
            prop_assert_eq!(
                slot.interval.duration_minutes(),
                i64::from(policy.slot_duration_minutes)
            );
            prop_assert_eq!(slot.duration_minutes, policy.slot_duration_minutes);
        }
    }

    #[test]
    fn consecutive_candidates_are_exactly_one_step_apart(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        let step = i64::from(policy.slot_duration_minutes + policy.buffer_minutes);
        for pair in slots.windows(2) {
            prop_assert_eq!(
                (pair[1].interval.start - pair[0].interval.start).num_minutes(),
                step
            );
        }
    }

    #[test]
    fn slots_stay_inside_the_open_window(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        for slot in &slots {
            prop_assert!(slot.interval.start >= open.start);
            prop_assert!(slot.interval.end <= open.end);
        }
    }

    #[test]
    fn available_slots_never_overlap_each_other(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        let available: Vec<_> = slots.iter().filter(|s| s.available).collect();
        for (i, a) in available.iter().enumerate() {
            for b in &available[i + 1..] {
                prop_assert!(
                    !a.interval.overlaps(&b.interval),
                    "offered {:?} and {:?} twice",
                    a.interval,
                    b.interval
                );
            }
        }
    }

    #[test]
    fn available_slots_overlap_no_busy_interval(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        for slot in slots.iter().filter(|s| s.available) {
            for b in &busy.intervals {
                prop_assert!(
                    !slot.interval.overlaps(&b.interval),
                    "available slot {:?} overlaps busy {:?}",
                    slot.interval,
                    b.interval
                );
            }
        }
    }

    #[test]
    fn blocked_slots_carry_a_reason_and_open_slots_none(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        for slot in &slots {
            prop_assert_eq!(slot.available, slot.block_reason.is_none());
        }
    }

    #[test]
    fn generation_is_deterministic(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let first = generate_slots(&open, &[], &busy, &policy, None);
        let second = generate_slots(&open, &[], &busy, &policy, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn output_is_chronologically_ordered(
        open in arb_open(),
        busy in arb_busy(),
        policy in arb_policy(),
    ) {
        let slots = generate_slots(&open, &[], &busy, &policy, None);
        for pair in slots.windows(2) {
            prop_assert!(pair[0].interval.start < pair[1].interval.start);
        }
    }
}
