//! Four-pole transistor-ladder lowpass filter.
//!
//! Four cascaded one-pole stages with tanh-limited resonance feedback
//! from the last stage. The coefficient mapping is the simple
//! `g = 2π·fc/fs` approximation, which tracks well below Nyquist/2 and is
//! cheap enough to update per block from the modulation matrix.

use core::f32::consts::PI;
use libm::tanhf;

use calliope_core::{AudioBuffer, Processor};

/// Moog-style 4-pole lowpass.
#[derive(Debug, Clone)]
pub struct LadderFilter {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    g: f32,
    stages: [f32; 4],
}

impl LadderFilter {
    /// Creates a fully-open filter (cutoff 20 kHz, no resonance).
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: 20_000.0,
            resonance: 0.0,
            g: 0.0,
            stages: [0.0; 4],
        };
        filter.update_coefficient();
        filter
    }

    /// Sets the cutoff frequency, clamped to `[20 Hz, 0.45 · fs]`.
    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = hz.clamp(20.0, self.sample_rate * 0.45);
        self.update_coefficient();
    }

    /// Sets resonance, clamped to `[0, 1]`. Near 1 the filter approaches
    /// self-oscillation; the tanh in the feedback path keeps it bounded.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Current resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Updates the sample rate, re-clamping the cutoff against the new
    /// Nyquist bound.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_cutoff(self.cutoff);
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let feedback = self.stages[3] * self.resonance * 4.0;
        let driven = input - tanhf(feedback);

        self.stages[0] += self.g * (driven - self.stages[0]);
        self.stages[1] += self.g * (self.stages[0] - self.stages[1]);
        self.stages[2] += self.g * (self.stages[1] - self.stages[2]);
        self.stages[3] += self.g * (self.stages[2] - self.stages[3]);

        self.stages[3]
    }

    fn update_coefficient(&mut self) {
        self.g = (2.0 * PI * self.cutoff / self.sample_rate).clamp(0.0, 1.0);
    }
}

impl Processor for LadderFilter {
    fn pull(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Dual-mono: both channels are collapsed through the single filter
    /// state. Voices place the filter before the pan stage, so this is
    /// only reached on externally-built stereo chains.
    fn pull_stereo(&mut self, output: &mut AudioBuffer<'_>) {
        for i in 0..output.frames() {
            let combined = (output.left[i] + output.right[i]) * 0.5;
            let filtered = self.process(combined);
            output.left[i] = filtered;
            output.right[i] = filtered;
        }
    }

    /// Zeroes the stage memories; cutoff and resonance survive.
    fn reset(&mut self) {
        self.stages = [0.0; 4];
    }
}
