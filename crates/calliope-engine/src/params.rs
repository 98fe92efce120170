//! The engine's symbolic parameter table.
//!
//! Control surfaces and patch files address parameters by name. The
//! [`ParamSet`] is the canonical snapshot of those values: the engine's
//! typed setters clamp into range and store here before fanning out to
//! the voices, and patch save serializes this struct, so a save → load →
//! save round trip is byte-stable.

use crate::error::EngineError;

/// Canonical values of every named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    /// Filter base cutoff in Hz.
    pub cutoff: f32,
    /// Filter base resonance.
    pub resonance: f32,
    /// Envelope attack in seconds.
    pub attack: f32,
    /// Envelope decay in seconds.
    pub decay: f32,
    /// Envelope sustain level.
    pub sustain: f32,
    /// Envelope release in seconds.
    pub release: f32,
    /// Pulse oscillator base width.
    pub pulse_width: f32,
    /// Mixer gain: sawtooth channel.
    pub gain_saw: f32,
    /// Mixer gain: pulse channel.
    pub gain_pulse: f32,
    /// Mixer gain: sub-oscillator channel.
    pub gain_sub: f32,
    /// Mixer gain: noise channel.
    pub gain_noise: f32,
    /// Master gain on the voice sum.
    pub master_gain: f32,
}

impl Default for ParamSet {
    /// The engine's default timbre: open filter, saw source, organ-style
    /// envelope.
    fn default() -> Self {
        Self {
            cutoff: 20_000.0,
            resonance: 0.0,
            attack: 0.015,
            decay: 0.001,
            sustain: 1.0,
            release: 0.050,
            pulse_width: 0.5,
            gain_saw: 1.0,
            gain_pulse: 0.0,
            gain_sub: 0.0,
            gain_noise: 0.0,
            master_gain: 0.2,
        }
    }
}

impl ParamSet {
    /// Looks a value up by symbolic name.
    pub fn get(&self, name: &str) -> Result<f32, EngineError> {
        match name {
            "cutoff" => Ok(self.cutoff),
            "resonance" => Ok(self.resonance),
            "attack" => Ok(self.attack),
            "decay" => Ok(self.decay),
            "sustain" => Ok(self.sustain),
            "release" => Ok(self.release),
            "pulse_width" => Ok(self.pulse_width),
            "gain_saw" => Ok(self.gain_saw),
            "gain_pulse" => Ok(self.gain_pulse),
            "gain_sub" => Ok(self.gain_sub),
            "gain_noise" => Ok(self.gain_noise),
            "master_gain" => Ok(self.master_gain),
            _ => Err(EngineError::UnknownParameter(name.to_string())),
        }
    }

    /// True when a parameter with this name exists.
    pub fn contains(name: &str) -> bool {
        Self::names().contains(&name)
    }

    /// Every parameter name, in canonical order.
    pub fn names() -> &'static [&'static str] {
        &[
            "cutoff",
            "resonance",
            "attack",
            "decay",
            "sustain",
            "release",
            "pulse_width",
            "gain_saw",
            "gain_pulse",
            "gain_sub",
            "gain_noise",
            "master_gain",
        ]
    }

    /// Iterates `(name, value)` pairs in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        Self::names().iter().filter_map(|name| {
            self.get(name).ok().map(|value| (*name, value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_by_name() {
        let params = ParamSet::default();
        assert_eq!(params.get("cutoff").unwrap(), 20_000.0);
        assert_eq!(params.get("sustain").unwrap(), 1.0);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let params = ParamSet::default();
        assert!(matches!(
            params.get("wobble"),
            Err(EngineError::UnknownParameter(_))
        ));
        assert!(!ParamSet::contains("wobble"));
        assert!(ParamSet::contains("resonance"));
    }

    #[test]
    fn entries_cover_every_name() {
        let params = ParamSet::default();
        let entries: Vec<_> = params.entries().collect();
        assert_eq!(entries.len(), ParamSet::names().len());
        assert_eq!(entries[0], ("cutoff", 20_000.0));
        assert_eq!(entries.last().unwrap(), &("master_gain", 0.2));
    }

    #[test]
    fn defaults_match_the_voice_defaults() {
        let params = ParamSet::default();
        assert_eq!(params.attack, 0.015);
        assert_eq!(params.decay, 0.001);
        assert_eq!(params.sustain, 1.0);
        assert_eq!(params.release, 0.050);
        assert_eq!(params.gain_saw, 1.0);
    }
}
