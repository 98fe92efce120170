//! Calliope Synth - polyphonic voices and their DSP primitives
//!
//! This crate builds the per-voice signal chain and the polyphonic
//! allocator on top of `calliope-core`'s pull model:
//!
//! - [`Oscillator`] band-limited multi-source oscillator with glide
//! - [`SubOscillator`] phase-locked square an octave (or two) down
//! - [`SourceMixer`] five weighted channels through a tanh saturator
//! - [`AdsrEnvelope`] gate-driven amplitude envelope
//! - [`LadderFilter`] four-pole lowpass with resonance feedback
//! - [`Lfo`] block-rate modulation oscillator
//! - [`ModulationMatrix`] fixed-capacity source→target routing
//! - [`Voice`] one polyphonic slot: the full chain plus its private matrix
//! - [`VoiceManager`] allocation, stealing, dispatch, and the stereo sum

pub mod envelope;
pub mod filter;
pub mod lfo;
pub mod mixer;
pub mod mod_matrix;
pub mod oscillator;
pub mod sub;
pub mod voice;
pub mod voice_manager;

pub use envelope::{AdsrEnvelope, EnvelopeState};
pub use filter::LadderFilter;
pub use lfo::{Lfo, LfoWaveform};
pub use mixer::{SourceChannel, SourceMixer};
pub use mod_matrix::{ModConnection, ModSource, ModTarget, ModulationMatrix, SourceValues};
pub use oscillator::{Oscillator, SourceSamples, Waveform};
pub use sub::{SubOctave, SubOscillator};
pub use voice::Voice;
pub use voice_manager::{midi_note_to_freq, VoiceManager, VoiceSlot};

/// Engine-wide polyphony: the number of voices the standard manager runs.
pub const MAX_VOICES: usize = 16;
