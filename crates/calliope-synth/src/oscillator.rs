//! Band-limited oscillator with glide and pitch modulation.
//!
//! One phase accumulator feeds everything a voice mixes: the selected
//! standalone waveform for graph use, and [`SourceSamples`] — simultaneous
//! saw, pulse, and noise samples — for the voice's source mixer. Saw and
//! pulse edges carry PolyBLEP corrections to keep aliasing down.

use core::f32::consts::PI;
use libm::{exp2f, sinf};

use calliope_core::Processor;

/// Fallback frequency installed by `reset` when none was ever set.
const DEFAULT_FREQUENCY: f32 = 440.0;

/// Selectable waveform for standalone (single-output) use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Pure sine.
    Sine,
    /// Naive triangle (modulation-grade, not band-limited).
    Triangle,
    /// Band-limited sawtooth.
    #[default]
    Saw,
    /// Band-limited square (50% pulse).
    Square,
    /// Band-limited pulse at the configured width.
    Pulse,
}

/// One tick's worth of mixer source material.
///
/// All three samples are generated from the same phase position, which is
/// also reported so a phase-locked sub-oscillator can track it.
#[derive(Clone, Copy, Debug)]
pub struct SourceSamples {
    /// Band-limited sawtooth sample.
    pub saw: f32,
    /// Band-limited pulse sample at the current effective width.
    pub pulse: f32,
    /// White noise sample.
    pub noise: f32,
    /// Phase position these samples were generated at, in `[0, 1)`.
    pub phase: f32,
}

/// Audio-rate oscillator with PolyBLEP anti-aliasing, linear frequency
/// glide, and octave-based pitch modulation.
#[derive(Debug, Clone)]
pub struct Oscillator {
    sample_rate: f32,
    /// Current phase position `[0, 1)`.
    phase: f32,
    /// Glide-ramped frequency in Hz.
    current_freq: f32,
    target_freq: f32,
    /// Hz added per sample while gliding.
    freq_step: f32,
    gliding: bool,
    /// Pitch modulation as a frequency ratio (`2^octaves`), cached.
    pitch_ratio: f32,
    pulse_width: f32,
    pwm_delta: f32,
    waveform: Waveform,
    noise_state: u32,
}

impl Oscillator {
    /// Creates an oscillator at the given sample rate, tuned to 440 Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            current_freq: DEFAULT_FREQUENCY,
            target_freq: DEFAULT_FREQUENCY,
            freq_step: 0.0,
            gliding: false,
            pitch_ratio: 1.0,
            pulse_width: 0.5,
            pwm_delta: 0.0,
            waveform: Waveform::default(),
            noise_state: 0x1234_5678,
        }
    }

    /// Sets the frequency instantly, cancelling any glide in progress.
    pub fn set_frequency(&mut self, hz: f32) {
        self.current_freq = hz.max(0.0);
        self.target_freq = self.current_freq;
        self.gliding = false;
    }

    /// Ramps linearly to `hz` over `seconds`. A zero or negative duration
    /// is an instant change. The ramp halts exactly at the target; the
    /// step's sign decides which side the termination test watches.
    pub fn set_frequency_glide(&mut self, hz: f32, seconds: f32) {
        if seconds <= 0.0 {
            self.set_frequency(hz);
            return;
        }
        self.target_freq = hz.max(0.0);
        let total_samples = (seconds * self.sample_rate).max(1.0);
        self.freq_step = (self.target_freq - self.current_freq) / total_samples;
        self.gliding = self.freq_step != 0.0;
    }

    /// Current (possibly mid-glide) frequency in Hz, before pitch
    /// modulation.
    pub fn frequency(&self) -> f32 {
        self.current_freq
    }

    /// Sets pitch modulation in octaves: the effective frequency is
    /// `frequency() * 2^octaves`.
    pub fn set_pitch_modulation(&mut self, octaves: f32) {
        self.pitch_ratio = exp2f(octaves);
    }

    /// Sets the base pulse width, clamped to `[0.01, 0.99]`.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width = width.clamp(0.01, 0.99);
    }

    /// Sets the pulse-width modulation offset added to the base width each
    /// sample (the sum is clamped back into `[0.01, 0.99]`).
    pub fn set_pulse_width_modulation(&mut self, delta: f32) {
        self.pwm_delta = delta;
    }

    /// Selects the standalone waveform.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current standalone waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Updates the sample rate. An in-flight glide keeps its Hz-per-sample
    /// step.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Phase position of the *next* sample, in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Generates the next sample of the selected waveform.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.update_glide();
        let dt = self.effective_dt();
        let phase = self.phase;
        let out = match self.waveform {
            Waveform::Sine => sinf(phase * 2.0 * PI),
            Waveform::Triangle => 2.0 * libm::fabsf(2.0 * phase - 1.0) - 1.0,
            Waveform::Saw => saw_blep(phase, dt),
            Waveform::Square => pulse_blep(phase, 0.5, dt),
            Waveform::Pulse => pulse_blep(phase, self.effective_pulse_width(), dt),
        };
        self.advance_phase(dt);
        out
    }

    /// Generates the next saw, pulse, and noise samples from a single
    /// phase position (the voice's mixer feed).
    #[inline]
    pub fn advance_sources(&mut self) -> SourceSamples {
        self.update_glide();
        let dt = self.effective_dt();
        let phase = self.phase;
        let samples = SourceSamples {
            saw: saw_blep(phase, dt),
            pulse: pulse_blep(phase, self.effective_pulse_width(), dt),
            noise: self.next_noise(),
            phase,
        };
        self.advance_phase(dt);
        samples
    }

    #[inline]
    fn effective_pulse_width(&self) -> f32 {
        (self.pulse_width + self.pwm_delta).clamp(0.01, 0.99)
    }

    #[inline]
    fn effective_dt(&self) -> f32 {
        (self.current_freq * self.pitch_ratio) / self.sample_rate
    }

    #[inline]
    fn advance_phase(&mut self, dt: f32) {
        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        if self.phase < 0.0 {
            self.phase += 1.0;
        }
    }

    #[inline]
    fn update_glide(&mut self) {
        if !self.gliding {
            return;
        }
        self.current_freq += self.freq_step;
        let reached = if self.freq_step > 0.0 {
            self.current_freq >= self.target_freq
        } else {
            self.current_freq <= self.target_freq
        };
        if reached {
            self.current_freq = self.target_freq;
            self.gliding = false;
        }
    }

    #[inline]
    fn next_noise(&mut self) -> f32 {
        // Xorshift32.
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }
}

impl Processor for Oscillator {
    fn pull(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.advance();
        }
    }

    /// Clears phase, glide, and noise state. The frequency is preserved so
    /// a stolen voice retriggers at a sane pitch; a never-set (zero)
    /// frequency falls back to 440 Hz.
    fn reset(&mut self) {
        self.phase = 0.0;
        self.freq_step = 0.0;
        self.gliding = false;
        self.noise_state = 0x1234_5678;
        if self.current_freq == 0.0 {
            self.current_freq = DEFAULT_FREQUENCY;
            self.target_freq = DEFAULT_FREQUENCY;
        }
    }
}

/// Band-limited sawtooth at a phase position.
#[inline]
fn saw_blep(phase: f32, dt: f32) -> f32 {
    (2.0 * phase - 1.0) - poly_blep(phase, dt)
}

/// Band-limited pulse at a phase position and duty width.
#[inline]
fn pulse_blep(phase: f32, width: f32, dt: f32) -> f32 {
    let naive = if phase < width { 1.0 } else { -1.0 };
    let falling = wrap01(phase - width + 1.0);
    naive + poly_blep(phase, dt) - poly_blep(falling, dt)
}

#[inline]
fn wrap01(x: f32) -> f32 {
    if x >= 1.0 {
        x - 1.0
    } else {
        x
    }
}

/// Two-sample polynomial band-limited step correction.
///
/// Quadratic residual applied within one sample of a discontinuity on
/// either side; zero elsewhere.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
