//! Sample-accurate musical time.
//!
//! [`MusicalClock`] tracks bar/beat/tick position from a continuous sample
//! count at 960 PPQ. Tempo and sample-rate changes "anchor" the clock —
//! the current sample and tick totals are recorded as bases before the
//! tick duration is recomputed — so the derived tick count is continuous
//! across the change and only diverges afterward. This keeps sub-tick
//! accuracy over hours of playback without accumulating rounding error at
//! tempo changes.

/// Pulses per quarter note.
pub const PPQ: i64 = 960;

/// A point in musical time.
///
/// Bars and beats are 1-based; ticks are 0-based within the beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MusicalTime {
    /// 1-based bar number.
    pub bar: i32,
    /// 1-based beat number within the bar.
    pub beat: i32,
    /// 0-based tick number within the beat, in `[0, PPQ)`.
    pub tick: i32,
}

/// Sample-accurate bar/beat/tick clock.
#[derive(Debug, Clone)]
pub struct MusicalClock {
    sample_rate: f64,
    bpm: f64,
    beats_per_bar: i32,

    samples_per_tick: f64,
    /// Continuous high-precision sample counter.
    total_samples: f64,
    /// Sample count recorded at the last tempo or rate change.
    total_samples_base: f64,
    /// Current total ticks, derived from the anchor.
    total_ticks: i64,
    /// Tick count recorded at the last tempo or rate change.
    total_ticks_base: i64,
}

impl MusicalClock {
    /// Creates a clock at the given sample rate and tempo, in 4/4.
    pub fn new(sample_rate: f64, bpm: f64) -> Self {
        let mut clock = Self {
            sample_rate,
            bpm,
            beats_per_bar: 4,
            samples_per_tick: 0.0,
            total_samples: 0.0,
            total_samples_base: 0.0,
            total_ticks: 0,
            total_ticks_base: 0,
        };
        clock.update_tick_duration();
        clock
    }

    /// Changes the tempo. Anchors first so the current position is
    /// preserved exactly across the change.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.anchor();
        self.bpm = bpm.max(1.0);
        self.update_tick_duration();
    }

    /// Changes the sample rate. Anchors first, like a tempo change.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.anchor();
        self.sample_rate = sample_rate;
        self.update_tick_duration();
    }

    /// Sets the meter (beats per bar). Affects only how ticks are broken
    /// into bars and beats, not the tick rate itself.
    pub fn set_meter(&mut self, beats_per_bar: i32) {
        self.beats_per_bar = beats_per_bar.max(1);
    }

    /// Advances the clock by a number of samples (called once per block by
    /// the render path).
    pub fn advance(&mut self, num_samples: u32) {
        self.total_samples += f64::from(num_samples);

        let samples_since_base = self.total_samples - self.total_samples_base;
        let ticks_since_base = libm::floor(samples_since_base / self.samples_per_tick) as i64;
        self.total_ticks = self.total_ticks_base + ticks_since_base;
    }

    /// Current position as bar/beat/tick.
    pub fn current_time(&self) -> MusicalTime {
        let ticks_per_bar = PPQ * i64::from(self.beats_per_bar);
        let bar = (self.total_ticks / ticks_per_bar) as i32 + 1;
        let in_bar = self.total_ticks % ticks_per_bar;
        let beat = (in_bar / PPQ) as i32 + 1;
        let tick = (in_bar % PPQ) as i32;
        MusicalTime { bar, beat, tick }
    }

    /// Current tempo in BPM.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Current meter in beats per bar.
    pub fn beats_per_bar(&self) -> i32 {
        self.beats_per_bar
    }

    /// Total elapsed ticks since construction.
    pub fn total_ticks(&self) -> i64 {
        self.total_ticks
    }

    /// Current samples-per-tick duration.
    pub fn samples_per_tick(&self) -> f64 {
        self.samples_per_tick
    }

    fn anchor(&mut self) {
        self.total_ticks_base = self.total_ticks;
        self.total_samples_base = self.total_samples;
    }

    fn update_tick_duration(&mut self) {
        let ticks_per_second = (self.bpm / 60.0) * PPQ as f64;
        self.samples_per_tick = self.sample_rate / ticks_per_second;
    }
}

impl Default for MusicalClock {
    fn default() -> Self {
        Self::new(44_100.0, 120.0)
    }
}
