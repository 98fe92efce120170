//! Gate-driven ADSR amplitude envelope.
//!
//! Linear attack, decay, and release ramps through the classic four
//! stages. Output lies in `[0, 1]` and reaches exactly 0 only in the
//! terminal `Idle` state, which is what the voice allocator's lazy
//! reclamation watches for.

use calliope_core::Processor;

/// ADSR stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Inactive; output is zero.
    #[default]
    Idle,
    /// Ramping up toward peak.
    Attack,
    /// Falling from peak toward the sustain level.
    Decay,
    /// Holding at the sustain level while the gate is on.
    Sustain,
    /// Falling toward zero after gate-off.
    Release,
}

/// Four-stage linear ADSR envelope.
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    sample_rate: f32,
    state: EnvelopeState,
    level: f32,

    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    attack_rate: f32,
    decay_rate: f32,
    release_rate: f32,
}

impl AdsrEnvelope {
    /// Creates an envelope with moderate defaults (10 ms / 100 ms / 0.7 /
    /// 200 ms).
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            sample_rate,
            state: EnvelopeState::Idle,
            level: 0.0,
            attack_time: 0.010,
            decay_time: 0.100,
            sustain_level: 0.7,
            release_time: 0.200,
            attack_rate: 0.0,
            decay_rate: 0.0,
            release_rate: 0.0,
        };
        env.update_rates();
        env
    }

    /// Opens the gate: enters attack from the current level, so a
    /// retrigger mid-flight does not click.
    pub fn gate_on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.update_rates();
    }

    /// Closes the gate: any non-idle state moves to release. The release
    /// ramp is scaled from the level at gate-off so the configured release
    /// time is honored wherever the envelope was interrupted.
    pub fn gate_off(&mut self) {
        if self.state == EnvelopeState::Idle {
            return;
        }
        if self.level <= 0.0 {
            self.state = EnvelopeState::Idle;
            return;
        }
        self.release_rate = self.level / (self.release_time * self.sample_rate);
        self.state = EnvelopeState::Release;
    }

    /// True in any non-idle state.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// True while in the release stage.
    pub fn is_releasing(&self) -> bool {
        self.state == EnvelopeState::Release
    }

    /// Current stage.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current output level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Sets attack time in seconds, clamped to ≥ 1 ms.
    pub fn set_attack_time(&mut self, seconds: f32) {
        self.attack_time = seconds.max(0.001);
        self.update_rates();
    }

    /// Sets decay time in seconds, clamped to ≥ 1 ms.
    pub fn set_decay_time(&mut self, seconds: f32) {
        self.decay_time = seconds.max(0.001);
        self.update_rates();
    }

    /// Sets the sustain level, clamped to `[0, 1]`.
    pub fn set_sustain_level(&mut self, level: f32) {
        self.sustain_level = level.clamp(0.0, 1.0);
        self.update_rates();
    }

    /// Sets release time in seconds, clamped to ≥ 1 ms.
    pub fn set_release_time(&mut self, seconds: f32) {
        self.release_time = seconds.max(0.001);
        self.update_rates();
    }

    /// Attack time in seconds.
    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    /// Decay time in seconds.
    pub fn decay_time(&self) -> f32 {
        self.decay_time
    }

    /// Sustain level.
    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    /// Release time in seconds.
    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    /// Updates the sample rate and recomputes ramp rates.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_rates();
    }

    /// Advances one sample and returns the new level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }
            EnvelopeState::Attack => {
                self.level += self.attack_rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.level -= self.decay_rate;
                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }
            EnvelopeState::Release => {
                self.level -= self.release_rate;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        self.level
    }

    fn update_rates(&mut self) {
        self.attack_rate = 1.0 / (self.attack_time * self.sample_rate);
        self.decay_rate = (1.0 - self.sustain_level) / (self.decay_time * self.sample_rate);
        self.release_rate = self.sustain_level.max(0.001) / (self.release_time * self.sample_rate);
    }
}

impl Processor for AdsrEnvelope {
    fn pull(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.advance();
        }
    }

    /// Returns to idle with zero output. Times and sustain level are
    /// parameters and survive the reset.
    fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }
}
