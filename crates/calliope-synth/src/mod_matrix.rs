//! Per-voice modulation routing.
//!
//! A fixed-capacity table of source→target connections summed once per
//! block. Fixed arrays keep memory bounded and the summation loop
//! branch-predictable; sixteen connections per voice is ample for the
//! musical scope of this engine.

/// Control-rate modulation sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModSource {
    /// The voice's amplitude envelope level.
    Envelope = 0,
    /// The voice's LFO.
    Lfo = 1,
    /// Note-on velocity, scaled to `[0, 1]`.
    Velocity = 2,
    /// Channel aftertouch, scaled to `[0, 1]`.
    Aftertouch = 3,
}

/// Number of modulation sources.
pub const NUM_SOURCES: usize = 4;

/// Modulatable audio-path parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModTarget {
    /// Oscillator pitch, in octaves (exponential).
    Pitch = 0,
    /// Filter cutoff, in octaves (exponential).
    Cutoff = 1,
    /// Filter resonance, linear offset.
    Resonance = 2,
    /// VCA gain factor, linear.
    Amplitude = 3,
    /// Pulse width, linear offset.
    PulseWidth = 4,
}

impl TryFrom<u8> for ModSource {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(ModSource::Envelope),
            1 => Ok(ModSource::Lfo),
            2 => Ok(ModSource::Velocity),
            3 => Ok(ModSource::Aftertouch),
            _ => Err(()),
        }
    }
}

impl TryFrom<u8> for ModTarget {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(ModTarget::Pitch),
            1 => Ok(ModTarget::Cutoff),
            2 => Ok(ModTarget::Resonance),
            3 => Ok(ModTarget::Amplitude),
            4 => Ok(ModTarget::PulseWidth),
            _ => Err(()),
        }
    }
}

/// One routing entry.
#[derive(Clone, Copy, Debug)]
pub struct ModConnection {
    /// Modulation source.
    pub source: ModSource,
    /// Destination parameter.
    pub target: ModTarget,
    /// Bipolar scaling factor.
    pub intensity: f32,
    /// Whether this slot is in use.
    pub active: bool,
}

impl Default for ModConnection {
    fn default() -> Self {
        Self {
            source: ModSource::Envelope,
            target: ModTarget::Amplitude,
            intensity: 0.0,
            active: false,
        }
    }
}

/// Current values of every modulation source, sampled once per block.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceValues {
    /// Envelope level `[0, 1]`.
    pub envelope: f32,
    /// LFO value `[-1, 1]`.
    pub lfo: f32,
    /// Velocity `[0, 1]`.
    pub velocity: f32,
    /// Aftertouch `[0, 1]`.
    pub aftertouch: f32,
}

impl SourceValues {
    /// Value for one source.
    #[inline]
    pub fn get(&self, source: ModSource) -> f32 {
        match source {
            ModSource::Envelope => self.envelope,
            ModSource::Lfo => self.lfo,
            ModSource::Velocity => self.velocity,
            ModSource::Aftertouch => self.aftertouch,
        }
    }
}

/// Maximum connections per matrix.
pub const MAX_CONNECTIONS: usize = 16;

/// Fixed-capacity source→target routing table.
#[derive(Debug, Clone, Default)]
pub struct ModulationMatrix {
    connections: [ModConnection; MAX_CONNECTIONS],
}

impl ModulationMatrix {
    /// Creates an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a connection.
    ///
    /// At most one active entry exists per `(source, target)` pair: a
    /// second set replaces the intensity. Returns false when the table is
    /// full and the connection was dropped (the caller decides whether to
    /// log).
    pub fn set_connection(&mut self, source: ModSource, target: ModTarget, intensity: f32) -> bool {
        for conn in &mut self.connections {
            if conn.active && conn.source == source && conn.target == target {
                conn.intensity = intensity;
                return true;
            }
        }
        for conn in &mut self.connections {
            if !conn.active {
                *conn = ModConnection {
                    source,
                    target,
                    intensity,
                    active: true,
                };
                return true;
            }
        }
        false
    }

    /// Deactivates the `(source, target)` connection, if present.
    pub fn clear_connection(&mut self, source: ModSource, target: ModTarget) {
        for conn in &mut self.connections {
            if conn.active && conn.source == source && conn.target == target {
                conn.active = false;
                return;
            }
        }
    }

    /// Deactivates every connection.
    pub fn clear_all(&mut self) {
        for conn in &mut self.connections {
            conn.active = false;
        }
    }

    /// True when an active `(source, target)` connection exists.
    pub fn has_connection(&self, source: ModSource, target: ModTarget) -> bool {
        self.connections
            .iter()
            .any(|c| c.active && c.source == source && c.target == target)
    }

    /// Number of active connections.
    pub fn active_count(&self) -> usize {
        self.connections.iter().filter(|c| c.active).count()
    }

    /// Iterates the active connections.
    pub fn connections(&self) -> impl Iterator<Item = &ModConnection> {
        self.connections.iter().filter(|c| c.active)
    }

    /// Sums all contributions for one target: Σ value(source) · intensity
    /// over the active connections routed there. The tight per-block hot
    /// function.
    #[inline]
    pub fn sum_for_target(&self, target: ModTarget, sources: &SourceValues) -> f32 {
        let mut sum = 0.0;
        for conn in &self.connections {
            if conn.active && conn.target == target {
                sum += sources.get(conn.source) * conn.intensity;
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matrix_sums_to_zero() {
        let matrix = ModulationMatrix::new();
        let sources = SourceValues {
            envelope: 1.0,
            lfo: 1.0,
            velocity: 1.0,
            aftertouch: 1.0,
        };
        assert_eq!(matrix.sum_for_target(ModTarget::Pitch, &sources), 0.0);
    }

    #[test]
    fn contributions_sum_per_target() {
        let mut matrix = ModulationMatrix::new();
        matrix.set_connection(ModSource::Lfo, ModTarget::Cutoff, 0.5);
        matrix.set_connection(ModSource::Envelope, ModTarget::Cutoff, 0.3);
        matrix.set_connection(ModSource::Lfo, ModTarget::Pitch, 2.0);

        let sources = SourceValues {
            envelope: 0.5,
            lfo: 1.0,
            ..SourceValues::default()
        };

        let cutoff = matrix.sum_for_target(ModTarget::Cutoff, &sources);
        assert!((cutoff - 0.65).abs() < 1e-6);
        let pitch = matrix.sum_for_target(ModTarget::Pitch, &sources);
        assert!((pitch - 2.0).abs() < 1e-6);
    }

    #[test]
    fn set_replaces_existing_pair() {
        let mut matrix = ModulationMatrix::new();
        matrix.set_connection(ModSource::Lfo, ModTarget::Pitch, 0.5);
        matrix.set_connection(ModSource::Lfo, ModTarget::Pitch, 0.25);
        assert_eq!(matrix.active_count(), 1);

        let sources = SourceValues {
            lfo: 1.0,
            ..SourceValues::default()
        };
        assert!((matrix.sum_for_target(ModTarget::Pitch, &sources) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn full_matrix_drops_new_pairs() {
        let mut matrix = ModulationMatrix::new();
        // 4 sources x 4 targets = 16 distinct pairs fill the table.
        for s in 0..4u8 {
            for t in 0..4u8 {
                assert!(matrix.set_connection(
                    ModSource::try_from(s).unwrap(),
                    ModTarget::try_from(t).unwrap(),
                    1.0
                ));
            }
        }
        assert_eq!(matrix.active_count(), MAX_CONNECTIONS);

        // A 17th distinct pair is a no-op...
        assert!(!matrix.set_connection(ModSource::Envelope, ModTarget::PulseWidth, 1.0));
        assert_eq!(matrix.active_count(), MAX_CONNECTIONS);

        // ...but updating an existing pair still works.
        assert!(matrix.set_connection(ModSource::Envelope, ModTarget::Pitch, 0.5));
    }

    #[test]
    fn clear_frees_the_slot() {
        let mut matrix = ModulationMatrix::new();
        matrix.set_connection(ModSource::Velocity, ModTarget::Amplitude, 1.0);
        assert!(matrix.has_connection(ModSource::Velocity, ModTarget::Amplitude));

        matrix.clear_connection(ModSource::Velocity, ModTarget::Amplitude);
        assert!(!matrix.has_connection(ModSource::Velocity, ModTarget::Amplitude));
        assert_eq!(matrix.active_count(), 0);
    }

    #[test]
    fn clear_all_empties_the_table() {
        let mut matrix = ModulationMatrix::new();
        matrix.set_connection(ModSource::Envelope, ModTarget::Amplitude, 1.0);
        matrix.set_connection(ModSource::Lfo, ModTarget::Pitch, 0.1);
        matrix.clear_all();
        assert_eq!(matrix.active_count(), 0);
    }

    #[test]
    fn enum_round_trip_through_u8() {
        for s in 0..NUM_SOURCES as u8 {
            let source = ModSource::try_from(s).unwrap();
            assert_eq!(source as u8, s);
        }
        for t in 0..5u8 {
            let target = ModTarget::try_from(t).unwrap();
            assert_eq!(target as u8, t);
        }
        assert!(ModSource::try_from(9).is_err());
        assert!(ModTarget::try_from(9).is_err());
    }
}
