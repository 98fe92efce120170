//! Phase-locked sub-oscillator.
//!
//! A square wave one or two octaves below a parent oscillator, generated
//! by tracking the parent's phase instead of running its own accumulator.
//! Zero drift against the parent, which is what the classic mono-synth
//! sub sound depends on.

use calliope_core::Processor;

/// How far below the parent the sub sits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubOctave {
    /// Half the parent frequency.
    #[default]
    OneDown,
    /// A quarter of the parent frequency.
    TwoDown,
}

/// Square wave slaved to a parent oscillator's phase.
#[derive(Debug, Clone)]
pub struct SubOscillator {
    octave: SubOctave,
    last_parent_phase: f32,
    wrap_counter: u32,
}

impl SubOscillator {
    /// Creates a sub-oscillator one octave down.
    pub fn new() -> Self {
        Self {
            octave: SubOctave::default(),
            last_parent_phase: 0.0,
            wrap_counter: 0,
        }
    }

    /// Selects the octave divisor.
    pub fn set_octave(&mut self, octave: SubOctave) {
        self.octave = octave;
    }

    /// Current octave divisor.
    pub fn octave(&self) -> SubOctave {
        self.octave
    }

    /// Produces the sub sample for the parent's current phase.
    ///
    /// The square flips each time the parent wraps (every second wrap for
    /// two octaves down), with an extra flip at the parent's half-phase so
    /// the sub's edges interleave with the parent's and headroom balances.
    #[inline]
    pub fn generate(&mut self, parent_phase: f32) -> f32 {
        if parent_phase < self.last_parent_phase {
            self.wrap_counter = self.wrap_counter.wrapping_add(1);
        }
        self.last_parent_phase = parent_phase;

        let mut positive = match self.octave {
            SubOctave::OneDown => self.wrap_counter % 2 == 0,
            SubOctave::TwoDown => self.wrap_counter % 4 < 2,
        };
        if parent_phase >= 0.5 {
            positive = !positive;
        }

        if positive {
            1.0
        } else {
            -1.0
        }
    }
}

impl Default for SubOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for SubOscillator {
    /// The sub has no standalone signal: it only makes sense against a
    /// parent phase, so a direct pull yields silence.
    fn pull(&mut self, output: &mut [f32]) {
        output.fill(0.0);
    }

    fn reset(&mut self) {
        self.last_parent_phase = 0.0;
        self.wrap_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEPS_PER_CYCLE: usize = 100;

    /// Drives the sub with a synthetic parent phase ramp and records its
    /// output.
    fn run(octave: SubOctave, parent_cycles: usize) -> Vec<f32> {
        let mut sub = SubOscillator::new();
        sub.set_octave(octave);
        (0..parent_cycles * STEPS_PER_CYCLE)
            .map(|i| {
                let phase = (i % STEPS_PER_CYCLE) as f32 / STEPS_PER_CYCLE as f32;
                sub.generate(phase)
            })
            .collect()
    }

    /// Asserts the waveform repeats every `cycles` parent cycles but not
    /// every `cycles / 2`.
    fn assert_period(octave: SubOctave, cycles: usize) {
        let out = run(octave, cycles * 8);
        let period = cycles * STEPS_PER_CYCLE;
        // Skip the first period while wrap tracking settles.
        for i in period..out.len() - period {
            assert_eq!(out[i], out[i + period], "not periodic at {i}");
        }
        let half = period / 2;
        assert!(
            (period..out.len() - half).any(|i| out[i] != out[i + half]),
            "period should not divide in two"
        );
    }

    #[test]
    fn one_down_repeats_every_two_parent_cycles() {
        assert_period(SubOctave::OneDown, 2);
    }

    #[test]
    fn two_down_repeats_every_four_parent_cycles() {
        assert_period(SubOctave::TwoDown, 4);
    }

    #[test]
    fn output_is_bipolar_square() {
        let mut sub = SubOscillator::new();
        for i in 0..1000 {
            let phase = (i % 100) as f32 / 100.0;
            let sample = sub.generate(phase);
            assert!(sample == 1.0 || sample == -1.0);
        }
    }

    #[test]
    fn reset_clears_tracking_state() {
        let mut sub = SubOscillator::new();
        for i in 0..250 {
            sub.generate((i % 100) as f32 / 100.0);
        }
        sub.reset();
        let mut fresh = SubOscillator::new();
        for i in 0..500 {
            let phase = (i % 100) as f32 / 100.0;
            assert_eq!(sub.generate(phase), fresh.generate(phase));
        }
    }
}
