//! One polyphonic voice.
//!
//! A voice owns its full signal chain — oscillator, phase-locked sub,
//! source mixer, ladder filter, ADSR, LFO — plus a private modulation
//! matrix and the base parameters modulation works around. Per block the
//! matrix is summed once (control rate = block rate) and applied to the
//! audio-path targets; per sample the sources are mixed, filtered, and
//! run through the VCA.
//!
//! A freshly built voice is audible with no configuration: the matrix
//! carries a hardwired `Envelope → Amplitude @ 1.0` connection which is
//! restored on note-on if a patch cleared it.

use core::f32::consts::PI;
use libm::{cosf, exp2f, sinf};

use calliope_core::{AudioBuffer, AudioLogger, Processor};

use crate::envelope::AdsrEnvelope;
use crate::filter::LadderFilter;
use crate::lfo::Lfo;
use crate::mixer::{SourceChannel, SourceMixer};
use crate::mod_matrix::{ModSource, ModTarget, ModulationMatrix, SourceValues};
use crate::oscillator::Oscillator;
use crate::sub::SubOscillator;

/// Block-to-block pitch jump (in octaves) above which smoothing engages:
/// one semitone.
const PITCH_SMOOTH_THRESHOLD: f32 = 1.0 / 12.0;
/// Block-to-block cutoff jump (in Hz) above which smoothing engages.
const CUTOFF_SMOOTH_THRESHOLD: f32 = 100.0;
/// One-pole coefficient for block-rate control smoothing.
const CONTROL_SMOOTH_COEFF: f32 = 0.5;

/// Envelope scratch capacity allocated up front; grows only if the host
/// requests larger blocks.
const INITIAL_SCRATCH: usize = 2048;

/// Smooths a block-rate control value, engaging only when the jump would
/// be audible.
#[derive(Debug, Clone, Copy)]
struct ControlSmoother {
    value: f32,
    threshold: f32,
}

impl ControlSmoother {
    fn new(initial: f32, threshold: f32) -> Self {
        Self {
            value: initial,
            threshold,
        }
    }

    #[inline]
    fn apply(&mut self, target: f32) -> f32 {
        if (target - self.value).abs() > self.threshold {
            self.value += CONTROL_SMOOTH_COEFF * (target - self.value);
        } else {
            self.value = target;
        }
        self.value
    }

    fn snap(&mut self, value: f32) {
        self.value = value;
    }
}

/// A single polyphonic slot: oscillators, mixer, filter, envelope, LFO,
/// and a private modulation matrix.
#[derive(Debug)]
pub struct Voice {
    oscillator: Oscillator,
    sub_osc: SubOscillator,
    mixer: SourceMixer,
    envelope: AdsrEnvelope,
    filter: LadderFilter,
    lfo: Lfo,
    matrix: ModulationMatrix,

    base_frequency: f32,
    base_cutoff: f32,
    base_resonance: f32,
    base_amplitude: f32,
    /// Pan position in `[-1, 1]`, 0 = center.
    pan: f32,

    velocity: f32,
    aftertouch: f32,

    pitch_smoother: ControlSmoother,
    cutoff_smoother: ControlSmoother,
    env_scratch: Vec<f32>,
}

impl Voice {
    /// Creates a voice with the default timbre: saw source, open filter,
    /// organ-style envelope (15 ms / 1 ms / 1.0 / 50 ms), and the default
    /// `Envelope → Amplitude` connection.
    pub fn new(sample_rate: f32) -> Self {
        let mut envelope = AdsrEnvelope::new(sample_rate);
        envelope.set_attack_time(0.015);
        envelope.set_decay_time(0.001);
        envelope.set_sustain_level(1.0);
        envelope.set_release_time(0.050);

        let mut mixer = SourceMixer::new();
        mixer.set_gain(SourceChannel::Saw, 1.0);

        let mut matrix = ModulationMatrix::new();
        matrix.set_connection(ModSource::Envelope, ModTarget::Amplitude, 1.0);

        Self {
            oscillator: Oscillator::new(sample_rate),
            sub_osc: SubOscillator::new(),
            mixer,
            envelope,
            filter: LadderFilter::new(sample_rate),
            lfo: Lfo::new(sample_rate, 1.0),
            matrix,
            base_frequency: 440.0,
            base_cutoff: 20_000.0,
            base_resonance: 0.0,
            base_amplitude: 1.0,
            pan: 0.0,
            velocity: 0.0,
            aftertouch: 0.0,
            pitch_smoother: ControlSmoother::new(0.0, PITCH_SMOOTH_THRESHOLD),
            cutoff_smoother: ControlSmoother::new(20_000.0, CUTOFF_SMOOTH_THRESHOLD),
            env_scratch: vec![0.0; INITIAL_SCRATCH],
        }
    }

    /// Starts a note: resets every primitive's internal state, installs
    /// the frequency, restores the default `Envelope → Amplitude`
    /// connection if a patch cleared it, and opens the gate.
    pub fn note_on(&mut self, frequency: f32, velocity: f32) {
        self.oscillator.reset();
        self.sub_osc.reset();
        self.filter.reset();
        self.envelope.reset();
        self.lfo.reset();

        self.base_frequency = frequency.max(0.0);
        self.oscillator.set_frequency(self.base_frequency);
        self.velocity = velocity.clamp(0.0, 1.0);

        if !self.matrix.has_connection(ModSource::Envelope, ModTarget::Amplitude) {
            self.matrix
                .set_connection(ModSource::Envelope, ModTarget::Amplitude, 1.0);
        }

        self.envelope.gate_on();
    }

    /// Releases the note; the voice stays audible until the envelope
    /// terminates.
    pub fn note_off(&mut self) {
        self.envelope.gate_off();
    }

    /// True while the envelope is non-terminal.
    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    /// True while the envelope is in its release stage.
    pub fn is_releasing(&self) -> bool {
        self.envelope.is_releasing()
    }

    /// Sets the pan position, clamped to `[-1, 1]`.
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    /// Current pan position.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Updates the aftertouch modulation source, clamped to `[0, 1]`.
    pub fn set_aftertouch(&mut self, value: f32) {
        self.aftertouch = value.clamp(0.0, 1.0);
    }

    /// Sets the filter's base cutoff anchor, clamped to `[20, 20000]` Hz.
    pub fn set_cutoff(&mut self, hz: f32) {
        self.base_cutoff = hz.clamp(20.0, 20_000.0);
    }

    /// Sets the filter's base resonance anchor, clamped to `[0, 0.99]`.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.base_resonance = resonance.clamp(0.0, 0.99);
    }

    /// Sets one mixer channel's gain.
    pub fn set_source_gain(&mut self, channel: SourceChannel, gain: f32) {
        self.mixer.set_gain(channel, gain);
    }

    /// Sets the pulse oscillator's base width.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.oscillator.set_pulse_width(width);
    }

    /// Sets the VCA's base amplitude factor.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.base_amplitude = amplitude.clamp(0.0, 2.0);
    }

    /// The amplitude envelope (times, sustain, state queries).
    pub fn envelope(&self) -> &AdsrEnvelope {
        &self.envelope
    }

    /// Mutable access to the amplitude envelope for ADSR setters.
    pub fn envelope_mut(&mut self) -> &mut AdsrEnvelope {
        &mut self.envelope
    }

    /// The voice's LFO.
    pub fn lfo_mut(&mut self) -> &mut Lfo {
        &mut self.lfo
    }

    /// The voice's private modulation matrix (read side, for persistence).
    pub fn matrix(&self) -> &ModulationMatrix {
        &self.matrix
    }

    /// Adds or updates a modulation connection. A full table drops the
    /// connection and reports it to the log ring.
    pub fn set_modulation(&mut self, source: ModSource, target: ModTarget, intensity: f32) {
        if !self.matrix.set_connection(source, target, intensity) {
            AudioLogger::global().log_message("ModMatrix", "connection table full, dropped");
        }
    }

    /// Removes a modulation connection.
    pub fn clear_modulation(&mut self, source: ModSource, target: ModTarget) {
        self.matrix.clear_connection(source, target);
    }

    /// Removes every modulation connection, including the default one
    /// (which note-on restores).
    pub fn clear_all_modulations(&mut self) {
        self.matrix.clear_all();
    }

    /// Propagates a sample-rate change to every primitive.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
        self.envelope.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.lfo.set_sample_rate(sample_rate);
    }

    /// Samples the modulation sources, sums the matrix, applies the
    /// targets, and returns the block's VCA amplitude factor.
    fn apply_modulation(&mut self, frames: usize) -> f32 {
        let sources = SourceValues {
            envelope: self.envelope.level(),
            lfo: self.lfo.block_value(frames),
            velocity: self.velocity,
            aftertouch: self.aftertouch,
        };

        let pitch_octaves = self.matrix.sum_for_target(ModTarget::Pitch, &sources);
        let smoothed_pitch = self.pitch_smoother.apply(pitch_octaves);
        self.oscillator.set_pitch_modulation(smoothed_pitch);

        let cutoff_octaves = self.matrix.sum_for_target(ModTarget::Cutoff, &sources);
        let cutoff = (self.base_cutoff * exp2f(cutoff_octaves)).clamp(20.0, 20_000.0);
        let smoothed_cutoff = self.cutoff_smoother.apply(cutoff);
        self.filter.set_cutoff(smoothed_cutoff);

        let resonance = self.matrix.sum_for_target(ModTarget::Resonance, &sources);
        self.filter
            .set_resonance((self.base_resonance + resonance).clamp(0.0, 0.99));

        let pulse_width = self.matrix.sum_for_target(ModTarget::PulseWidth, &sources);
        self.oscillator.set_pulse_width_modulation(pulse_width);

        let amplitude = self.matrix.sum_for_target(ModTarget::Amplitude, &sources);
        amplitude.clamp(0.0, 1.0) * self.base_amplitude
    }

    /// Renders one mono block: mix sources, filter, VCA.
    fn render_block(&mut self, output: &mut [f32]) {
        let frames = output.len();
        let amp_factor = self.apply_modulation(frames);

        for sample in output.iter_mut() {
            let sources = self.oscillator.advance_sources();
            let sub = self.sub_osc.generate(sources.phase);
            *sample = self
                .mixer
                .mix([sources.saw, sources.pulse, sub, sources.noise, 0.0]);
        }

        self.filter.pull(output);

        if self.env_scratch.len() < frames {
            self.env_scratch.resize(frames, 0.0);
        }
        let env = &mut self.env_scratch[..frames];
        self.envelope.pull(env);

        for (sample, env_level) in output.iter_mut().zip(env.iter()) {
            *sample *= env_level * amp_factor;
        }
    }
}

impl Processor for Voice {
    fn pull(&mut self, output: &mut [f32]) {
        self.render_block(output);
    }

    /// Stereo path: mono render plus constant-power panning. The pan
    /// position maps through a quarter-sine so the total power stays flat
    /// across the field.
    fn pull_stereo(&mut self, output: &mut AudioBuffer<'_>) {
        let frames = output.frames();
        self.render_block(&mut output.left[..frames]);

        let pan_rad = (self.pan + 1.0) * (PI / 4.0);
        let gain_l = cosf(pan_rad);
        let gain_r = sinf(pan_rad);

        for i in 0..frames {
            let sample = output.left[i];
            output.left[i] = sample * gain_l;
            output.right[i] = sample * gain_r;
        }
    }

    /// Resets every primitive and the control smoothers. Base parameters,
    /// mixer gains, matrix contents, and pan survive; the voice manager
    /// explicitly recenters pan when it recycles a voice.
    fn reset(&mut self) {
        self.oscillator.reset();
        self.sub_osc.reset();
        self.filter.reset();
        self.envelope.reset();
        self.lfo.reset();
        self.pitch_smoother.snap(0.0);
        self.cutoff_smoother.snap(self.base_cutoff);
    }
}
