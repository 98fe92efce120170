//! Integration tests for the polyphonic allocator and voice chain.
//!
//! Exercises the 16-voice configuration the engine ships with, including
//! the stealing scenarios and the slot/pitch invariants.

use calliope_core::Processor;
use calliope_synth::{ModSource, ModTarget, SourceChannel, VoiceManager, MAX_VOICES};

fn manager() -> VoiceManager<MAX_VOICES> {
    VoiceManager::new(48_000.0, 512)
}

fn render(vm: &mut VoiceManager<MAX_VOICES>, samples: usize) -> Vec<f32> {
    let mut out = vec![0.0; samples];
    for chunk in out.chunks_mut(512) {
        vm.pull(chunk);
    }
    out
}

fn assert_bijection(vm: &VoiceManager<MAX_VOICES>) {
    for pitch in 0..128u8 {
        if let Some(idx) = vm.slot_for_note(pitch) {
            let slot = &vm.slots()[idx];
            assert_eq!(slot.current_note(), Some(pitch), "map/slot disagree");
            assert!(slot.is_allocated());
        }
    }
    for (idx, slot) in vm.slots().iter().enumerate() {
        if let (true, Some(note)) = (slot.is_allocated(), slot.current_note()) {
            assert_eq!(
                vm.slot_for_note(note),
                Some(idx),
                "slot {idx} holds note {note} but the index does not point back"
            );
        }
    }
}

/// Sixteen notes fill the pool; a seventeenth steals the slot of the first
/// (oldest), leaving every other mapping untouched.
#[test]
fn seventeenth_note_steals_the_oldest() {
    let mut vm = manager();
    for pitch in 60..76u8 {
        vm.note_on(pitch, 1.0, None);
    }
    assert_eq!(vm.active_voice_count(), 16);
    let victim_slot = vm.slot_for_note(60).unwrap();

    vm.note_on(80, 1.0, None);

    assert_eq!(vm.slot_for_note(60), None);
    assert_eq!(vm.slot_for_note(80), Some(victim_slot));
    for pitch in 61..76u8 {
        assert!(vm.slot_for_note(pitch).is_some(), "pitch {pitch} displaced");
    }
    assert_bijection(&vm);
}

/// With one voice releasing, the steal takes it rather than the oldest
/// gated note.
#[test]
fn steal_prefers_the_releasing_voice() {
    let mut vm = manager();
    for pitch in 60..76u8 {
        vm.note_on(pitch, 1.0, None);
    }
    vm.note_off(65);
    let releasing_slot = vm
        .slots()
        .iter()
        .position(|s| s.voice().is_releasing())
        .expect("note 65 should be releasing");

    vm.note_on(90, 1.0, None);

    assert_eq!(vm.slot_for_note(90), Some(releasing_slot));
    assert!(
        vm.slot_for_note(60).is_some(),
        "oldest gated note must survive when a releasing voice exists"
    );
    assert_bijection(&vm);
}

/// A full chord sounds and sums within the master-gain budget.
#[test]
fn chord_renders_bounded_output() {
    let mut vm = manager();
    for pitch in [48u8, 52, 55, 60, 64, 67] {
        vm.note_on(pitch, 1.0, None);
    }
    let out = render(&mut vm, 9600);
    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.05, "chord should be audible, peak {peak}");
    assert!(out.iter().all(|s| s.is_finite()));
    assert!(
        peak <= 6.0 * 0.2,
        "six saturated voices at master gain 0.2 bound the sum: {peak}"
    );
}

/// The slot/pitch bijection holds at quiescent points across a random-ish
/// storm of note events.
#[test]
fn bijection_survives_a_note_storm() {
    let mut vm = manager();
    let mut state = 0x2545_F491u32;
    for _ in 0..2000 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let pitch = (state >> 8) as u8 & 0x7F;
        if state & 1 == 0 {
            vm.note_on(pitch, 0.8, None);
        } else {
            vm.note_off(pitch);
        }
        if state % 17 == 0 {
            render(&mut vm, 512);
        }
        assert_bijection(&vm);
    }
}

/// Per-voice modulation keeps working after voices are recycled.
#[test]
fn modulation_survives_stealing() {
    let mut vm = manager();
    for voice in vm.voices_mut() {
        voice.set_modulation(ModSource::Lfo, ModTarget::Pitch, 0.5);
        voice.lfo_mut().set_frequency(6.0);
        voice.set_source_gain(SourceChannel::Pulse, 0.5);
    }
    for pitch in 40..58u8 {
        vm.note_on(pitch, 1.0, None);
        render(&mut vm, 256);
    }
    let out = render(&mut vm, 4800);
    assert!(out.iter().all(|s| s.is_finite()));
    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.01);
}

/// Silence after everything releases and the tails run out.
#[test]
fn all_notes_decay_to_silence() {
    let mut vm = manager();
    for pitch in [60u8, 64, 67] {
        vm.note_on(pitch, 1.0, None);
    }
    render(&mut vm, 4800);
    for pitch in [60u8, 64, 67] {
        vm.note_off(pitch);
    }
    // 50 ms release; give it 0.5 s.
    render(&mut vm, 24_000);
    let out = render(&mut vm, 1024);
    assert!(out.iter().all(|&s| s == 0.0), "tails should have ended");
    assert_eq!(vm.active_voice_count(), 0);
}

/// The serial-chain wrapper drives a source → filter chain through one
/// buffer.
#[test]
fn graph_chains_oscillator_into_filter() {
    use calliope_core::AudioGraph;
    use calliope_synth::{LadderFilter, Oscillator};

    let mut osc = Oscillator::new(48_000.0);
    osc.set_frequency(110.0);
    let mut filter = LadderFilter::new(48_000.0);
    filter.set_cutoff(500.0);

    let mut graph = AudioGraph::new();
    graph.add_node(Box::new(osc));
    graph.add_node(Box::new(filter));

    let mut block = [0.0f32; 1024];
    graph.pull(&mut block);
    let peak = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.1, "110 Hz saw passes a 500 Hz lowpass: {peak}");
    assert!(block.iter().all(|s| s.is_finite()));

    graph.reset();
    let mut again = [0.0f32; 1024];
    graph.pull(&mut again);
    assert_eq!(block, again, "reset returns the chain to its start state");
}
