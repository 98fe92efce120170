//! Block-rate low-frequency oscillator.
//!
//! Modulation runs at block rate in this engine: the LFO produces one
//! value per block and advances its phase by the whole frame count.
//! Intensity changes are smoothed with a one-pole so automation does not
//! step audibly between blocks.

use core::f32::consts::PI;
use libm::{expf, fmodf, sinf};

use calliope_core::Processor;

/// LFO waveform shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Smooth sine.
    #[default]
    Sine,
    /// Linear up/down ramp.
    Triangle,
    /// Binary high/low.
    Square,
    /// Rising ramp with abrupt reset.
    Saw,
}

/// Block-rate modulation oscillator.
#[derive(Debug, Clone)]
pub struct Lfo {
    sample_rate: f32,
    phase: f32,
    frequency: f32,
    intensity: f32,
    smoothed_intensity: f32,
    smoothing_time: f32,
    waveform: LfoWaveform,
}

impl Lfo {
    /// Creates an LFO at the given rate and frequency, full intensity,
    /// sine shape, 10 ms intensity smoothing.
    pub fn new(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            frequency,
            intensity: 1.0,
            smoothed_intensity: 1.0,
            smoothing_time: 0.010,
            waveform: LfoWaveform::default(),
        }
    }

    /// Sets the LFO rate in Hz.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz.max(0.0);
    }

    /// Current rate in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Sets the output scale. The applied value approaches this through
    /// the one-pole smoother.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    /// Sets the intensity smoothing time constant in seconds. Zero
    /// disables smoothing.
    pub fn set_smoothing_time(&mut self, seconds: f32) {
        self.smoothing_time = seconds.max(0.0);
    }

    /// Selects the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Updates the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Produces the value for a block of `frames` samples and advances
    /// the phase past it.
    #[inline]
    pub fn block_value(&mut self, frames: usize) -> f32 {
        let value = self.waveform_at(self.phase);

        let alpha = if self.smoothing_time > 0.0 {
            1.0 - expf(-(frames as f32) / (self.smoothing_time * self.sample_rate))
        } else {
            1.0
        };
        self.smoothed_intensity += alpha * (self.intensity - self.smoothed_intensity);

        let phase_inc = self.frequency / self.sample_rate;
        self.phase = fmodf(self.phase + phase_inc * frames as f32, 1.0);

        value * self.smoothed_intensity
    }

    fn waveform_at(&self, phase: f32) -> f32 {
        match self.waveform {
            LfoWaveform::Sine => sinf(2.0 * PI * phase),
            LfoWaveform::Triangle => 2.0 * libm::fabsf(2.0 * phase - 1.0) - 1.0,
            LfoWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoWaveform::Saw => 2.0 * phase - 1.0,
        }
    }
}

impl Processor for Lfo {
    /// Fills the block with the (constant) block-rate value.
    fn pull(&mut self, output: &mut [f32]) {
        let value = self.block_value(output.len());
        output.fill(value);
    }

    /// Rewinds the phase and snaps the smoother. Frequency, intensity,
    /// and waveform survive.
    fn reset(&mut self) {
        self.phase = 0.0;
        self.smoothed_intensity = self.intensity;
    }
}
