//! Property-based tests for the core infrastructure.
//!
//! Covers clock monotonicity and tempo-change continuity, MIDI running
//! status, and ring ordering using proptest for randomized input
//! generation.

use proptest::prelude::*;

use calliope_core::{AudioLogger, MidiParser, MusicalClock};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// total_ticks is non-decreasing across any sequence of advances.
    #[test]
    fn clock_ticks_are_monotone(steps in prop::collection::vec(0u32..100_000, 1..64)) {
        let mut clock = MusicalClock::new(48_000.0, 120.0);
        let mut last = clock.total_ticks();
        for step in steps {
            clock.advance(step);
            prop_assert!(clock.total_ticks() >= last);
            last = clock.total_ticks();
        }
    }

    /// advance is additive: advancing in pieces matches one big advance.
    #[test]
    fn clock_advance_is_additive(
        a in 0u32..1_000_000,
        b in 0u32..1_000_000,
    ) {
        let mut split = MusicalClock::new(44_100.0, 97.0);
        split.advance(a);
        split.advance(b);

        let mut whole = MusicalClock::new(44_100.0, 97.0);
        whole.advance(a + b);

        prop_assert_eq!(split.total_ticks(), whole.total_ticks());
    }

    /// current_time immediately after a tempo or rate change equals
    /// current_time immediately before it.
    #[test]
    fn tempo_change_is_continuous(
        pre in 0u32..2_000_000,
        bpms in prop::collection::vec(30.0f64..300.0, 1..8),
        rates in prop::collection::vec(22_050.0f64..192_000.0, 1..4),
    ) {
        let mut clock = MusicalClock::new(48_000.0, 120.0);
        clock.advance(pre);

        for bpm in bpms {
            let before = clock.current_time();
            clock.set_bpm(bpm);
            prop_assert_eq!(clock.current_time(), before);
        }
        for rate in rates {
            let before = clock.current_time();
            clock.set_sample_rate(rate);
            prop_assert_eq!(clock.current_time(), before);
        }
    }

    /// For any 2-data-byte status and any run of pitch/velocity pairs, the
    /// parser emits one event per pair with the original status, whether or
    /// not the status byte was repeated.
    #[test]
    fn running_status_matches_explicit_status(
        status in prop::sample::select(vec![0x80u8, 0x90, 0x93, 0xB0, 0xE7]),
        pairs in prop::collection::vec((0u8..128, 0u8..128), 1..16),
    ) {
        // Stream A: status repeated before every pair.
        let mut explicit = Vec::new();
        for (d1, d2) in &pairs {
            explicit.extend_from_slice(&[status, *d1, *d2]);
        }
        // Stream B: status sent once, running status after.
        let mut running = vec![status];
        for (d1, d2) in &pairs {
            running.extend_from_slice(&[*d1, *d2]);
        }

        let mut parser = MidiParser::new();
        let mut from_explicit = Vec::new();
        parser.parse(&explicit, 0, |e| from_explicit.push(e));

        let mut parser = MidiParser::new();
        let mut from_running = Vec::new();
        parser.parse(&running, 0, |e| from_running.push(e));

        prop_assert_eq!(from_explicit, from_running);
    }

    /// The consumer observes entries in exactly producer order, regardless
    /// of how pushes are batched between pops.
    #[test]
    fn ring_preserves_order(batches in prop::collection::vec(1usize..20, 1..20)) {
        let logger = AudioLogger::with_capacity(1024);
        let mut pushed = 0u32;
        let mut popped = 0u32;

        for batch in batches {
            for _ in 0..batch {
                logger.log_event("seq", pushed as f32);
                pushed += 1;
            }
            // Drain half of what is outstanding.
            let outstanding = pushed - popped;
            for _ in 0..outstanding / 2 {
                let entry = logger.pop().unwrap();
                prop_assert_eq!(entry.value, popped as f32);
                popped += 1;
            }
        }

        while let Some(entry) = logger.pop() {
            prop_assert_eq!(entry.value, popped as f32);
            popped += 1;
        }
        prop_assert_eq!(pushed, popped);
    }
}
