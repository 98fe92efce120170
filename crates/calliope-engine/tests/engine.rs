//! End-to-end tests against the engine facade.
//!
//! These follow the host's view of the system: raw MIDI in, block renders
//! out, musical-time queries, and patch files.

use calliope_engine::{Engine, EngineError, Patch};
use calliope_synth::{ModSource, ModTarget};

fn render_mono(engine: &mut Engine, samples: usize, chunk: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; samples];
    for block in out.chunks_mut(chunk) {
        engine.render_mono(block);
    }
    out
}

/// Clock scenario: 120 BPM at 44.1 kHz for exactly one million samples
/// lands on tick 43_537 = bar 12, beat 2, tick 337.
#[test]
fn clock_position_after_a_million_samples() {
    let mut engine = Engine::new(44_100);
    // 2000 blocks x 500 frames = 1_000_000 samples.
    render_mono(&mut engine, 1_000_000, 500);

    let time = engine.musical_time();
    assert_eq!(time.bar, 12);
    assert_eq!(time.beat, 2);
    assert_eq!(time.tick, 337);
}

/// Note-on by name: "A4" resolves to MIDI 69 at exactly 440 Hz under the
/// default tuning.
#[test]
fn a4_by_name_is_midi_69_at_440() {
    let mut engine = Engine::new(48_000);
    engine.note_on_name("A4", 1.0).unwrap();
    assert!(engine.voices().slot_for_note(69).is_some());

    // Verify the pitch by counting cycles over one second.
    let out = render_mono(&mut engine, 48_000, 512);
    let mut crossings = 0;
    for i in 1..out.len() {
        if out[i - 1] <= 0.0 && out[i] > 0.0 {
            crossings += 1;
        }
    }
    // The first block is silent while the block-rate envelope source
    // ramps in, so allow a few cycles of slack.
    assert!(
        (crossings as i32 - 440).abs() <= 8,
        "A4 should render ~440 cycles/s, got {crossings}"
    );
}

/// A bad note spelling is an error and leaves the engine untouched.
#[test]
fn invalid_note_name_changes_nothing() {
    let mut engine = Engine::new(48_000);
    let result = engine.note_on_name("H#9zz", 1.0);
    assert!(matches!(result, Err(EngineError::InvalidNoteName(_))));
    assert_eq!(engine.active_voice_count(), 0);

    assert!(engine.note_off_name("Q2").is_err());
}

/// MIDI running status: one status byte, three note-ons.
#[test]
fn running_status_produces_three_notes() {
    let mut engine = Engine::new(48_000);
    engine.submit_midi(&[0x90, 0x43, 0x64, 0x45, 0x64, 0x47, 0x64], 0);

    assert_eq!(engine.active_voice_count(), 3);
    for pitch in [0x43u8, 0x45, 0x47] {
        assert!(
            engine.voices().slot_for_note(pitch).is_some(),
            "pitch {pitch} should be sounding"
        );
    }
}

/// Note-on with velocity zero releases like a note-off.
#[test]
fn velocity_zero_note_on_releases() {
    let mut engine = Engine::new(48_000);
    engine.submit_midi(&[0x90, 60, 100], 0);
    assert_eq!(engine.active_voice_count(), 1);

    engine.submit_midi(&[0x90, 60, 0], 0);
    assert!(engine.voices().slot_for_note(60).is_none());

    // The release tail ends and the slot frees.
    render_mono(&mut engine, 24_000, 512);
    assert_eq!(engine.active_voice_count(), 0);
}

/// Channel aftertouch reaches the voices' modulation source.
#[test]
fn channel_aftertouch_modulates_sounding_voices() {
    let mut engine = Engine::new(48_000);
    engine.clear_all_modulations();
    engine.set_modulation(ModSource::Envelope, ModTarget::Amplitude, 1.0);
    engine.set_modulation(ModSource::Aftertouch, ModTarget::Cutoff, -6.0);
    engine.set_cutoff(8000.0);

    engine.submit_midi(&[0x90, 45, 100], 0);
    let open = render_mono(&mut engine, 9600, 512);
    let open_energy: f32 = open.iter().map(|s| s * s).sum();

    // Full pressure drags the cutoff six octaves down, below the second
    // harmonic of the 110 Hz fundamental.
    engine.submit_midi(&[0xD0, 127], 0);
    let damped = render_mono(&mut engine, 9600, 512);
    let damped_energy: f32 = damped.iter().map(|s| s * s).sum();

    assert!(
        damped_energy < open_energy * 0.75,
        "aftertouch-closed filter should shed energy: {damped_energy} vs {open_energy}"
    );
}

/// The stereo render fills both channels with finite samples in [-1, 1]
/// even under full polyphony.
#[test]
fn stereo_render_is_finite_and_bounded() {
    let mut engine = Engine::new(48_000);
    for pitch in 36..52u8 {
        engine.note_on(pitch, 1.0);
    }

    let mut left = vec![0.0f32; 4096];
    let mut right = vec![0.0f32; 4096];
    for offset in (0..4096).step_by(512) {
        engine.render(
            &mut left[offset..offset + 512],
            &mut right[offset..offset + 512],
        );
    }

    for sample in left.iter().chain(right.iter()) {
        assert!(sample.is_finite());
        assert!((-1.0..=1.0).contains(sample), "sample out of range: {sample}");
    }
    let peak = left.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.01, "a sixteen-note cluster should be audible");
}

/// Tempo and meter setters are continuous and queryable.
#[test]
fn tempo_changes_preserve_musical_time() {
    let mut engine = Engine::new(48_000);
    render_mono(&mut engine, 100_000, 512);

    let before = engine.musical_time();
    engine.set_bpm(93.5);
    assert_eq!(engine.musical_time(), before);
    assert_eq!(engine.bpm(), 93.5);

    engine.set_bpm(120.0);
    assert_eq!(engine.bpm(), 120.0);
}

/// Patch save → load → save yields byte-identical output.
#[test]
fn patch_round_trip_is_byte_equal() {
    let mut engine = Engine::new(48_000);
    engine.set_cutoff(950.0);
    engine.set_resonance(0.4);
    engine.set_adsr(0.08, 0.3, 0.6, 1.2);
    engine.set_parameter("gain_pulse", 0.7).unwrap();
    engine.set_pulse_width(0.3);
    engine.set_modulation(ModSource::Lfo, ModTarget::Cutoff, 0.8);
    engine.set_modulation(ModSource::Velocity, ModTarget::Amplitude, 0.5);

    let saved = engine.to_patch("round-trip").to_json().unwrap();

    let mut second = Engine::new(48_000);
    second.apply_patch(&Patch::from_json(&saved).unwrap()).unwrap();
    let resaved = second.to_patch("round-trip").to_json().unwrap();

    assert_eq!(saved, resaved);
}

/// Patch files work through the filesystem API, and loading restores the
/// audible configuration.
#[test]
fn patch_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bass.json");

    let mut engine = Engine::new(48_000);
    engine.set_cutoff(400.0);
    engine.set_parameter("gain_sub", 0.9).unwrap();
    engine.save_patch("bass", &path).unwrap();

    let mut restored = Engine::new(48_000);
    restored.load_patch(&path).unwrap();
    assert_eq!(restored.get_parameter("cutoff").unwrap(), 400.0);
    assert_eq!(restored.get_parameter("gain_sub").unwrap(), 0.9);
}

/// A patch naming an unknown parameter is rejected before any state is
/// applied.
#[test]
fn bad_patch_is_rejected_atomically() {
    let mut engine = Engine::new(48_000);
    engine.set_cutoff(1234.0);

    let mut patch = engine.to_patch("bad");
    patch.parameters.insert("not_a_param".into(), 1.0);
    patch.parameters.insert("cutoff".into(), 50.0);

    assert!(engine.apply_patch(&patch).is_err());
    assert_eq!(engine.get_parameter("cutoff").unwrap(), 1234.0);
}

/// set_bpm / get_bpm round trip.
#[test]
fn bpm_round_trips() {
    let mut engine = Engine::new(48_000);
    engine.set_bpm(141.0);
    assert_eq!(engine.bpm(), 141.0);
}

/// The mono render degenerate case works standalone.
#[test]
fn mono_render_is_supported() {
    let mut engine = Engine::new(48_000);
    engine.note_on(60, 1.0);
    let out = render_mono(&mut engine, 4800, 480);
    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.01);
    assert!(out.iter().all(|s| s.is_finite()));
}
