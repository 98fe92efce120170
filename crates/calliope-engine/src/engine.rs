//! The engine facade.
//!
//! [`Engine`] is what a host embeds: it owns the voice manager, the
//! musical clock, the MIDI parser, and the tuning system, and exposes the
//! block-callback contract on one side and the control surface on the
//! other. Per block the engine advances the clock, pulls the voice sum
//! into the host's buffers, and returns; everything else is setters.

use calliope_core::{
    AudioBuffer, AudioLogger, AudioSettings, MidiParser, MusicalClock, MusicalTime, Note,
    Processor, TwelveToneEqual,
};
use calliope_synth::{ModSource, ModTarget, SourceChannel, VoiceManager, MAX_VOICES};

use crate::error::{EngineError, PatchError};
use crate::params::ParamSet;
use crate::patch::{Patch, PatchConnection};

/// The complete synthesizer: voice pool, clock, MIDI, tuning, parameters.
pub struct Engine {
    voices: VoiceManager<MAX_VOICES>,
    clock: MusicalClock,
    midi: MidiParser,
    tuning: TwelveToneEqual,
    params: ParamSet,
}

impl Engine {
    /// Creates an engine at the given sample rate, publishing it to the
    /// process-wide [`AudioSettings`]. Scratch blocks are sized to the
    /// currently negotiated block size.
    pub fn new(sample_rate: u32) -> Self {
        let settings = AudioSettings::global();
        settings.set_sample_rate(sample_rate);
        let block_frames = settings.block_size() as usize;

        let mut engine = Self {
            voices: VoiceManager::new(sample_rate as f32, block_frames),
            clock: MusicalClock::new(f64::from(sample_rate), 120.0),
            midi: MidiParser::new(),
            tuning: TwelveToneEqual::default(),
            params: ParamSet::default(),
        };
        engine.apply_params();
        engine
    }

    // --- Block callback contract -------------------------------------

    /// Renders one stereo block into the host's channel buffers.
    ///
    /// Advances the musical clock (and the log ring's sample clock) by
    /// the frame count first. Channel slices of unequal length are
    /// truncated to the shorter one.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        self.clock.advance(frames as u32);
        AudioLogger::global().advance_time(frames as u64);

        let mut buffer = AudioBuffer::new(&mut left[..frames], &mut right[..frames]);
        self.voices.pull_stereo(&mut buffer);

        // The block contract promises finite output in [-1, 1]; a dense
        // chord can sum past that, so saturate here.
        for sample in left[..frames].iter_mut().chain(right[..frames].iter_mut()) {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Mono degenerate case of the block contract: the caller may
    /// duplicate the channel to both outputs.
    pub fn render_mono(&mut self, output: &mut [f32]) {
        self.clock.advance(output.len() as u32);
        AudioLogger::global().advance_time(output.len() as u64);
        self.voices.pull(output);
        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Feeds raw MIDI bytes to the parser; completed events dispatch
    /// straight into the voice allocator. `sample_offset` is retained on
    /// the events for telemetry.
    pub fn submit_midi(&mut self, bytes: &[u8], sample_offset: u32) {
        let Self { midi, voices, .. } = self;
        midi.parse(bytes, sample_offset, |event| {
            voices.handle_midi_event(&event);
        });
    }

    // --- Notes --------------------------------------------------------

    /// Triggers a note by MIDI pitch with velocity in `[0, 1]`.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        self.voices.note_on(note, velocity, None);
    }

    /// Releases a note by MIDI pitch.
    pub fn note_off(&mut self, note: u8) {
        self.voices.note_off(note);
    }

    /// Triggers a note by spelling (`"A4"`, `"C#3"`, `"Bb-1"`), resolving
    /// its frequency through the tuning system. A bad spelling returns an
    /// error and leaves the engine untouched.
    pub fn note_on_name(&mut self, name: &str, velocity: f32) -> Result<(), EngineError> {
        let note = Note::parse(name)?;
        let freq = self.tuning.frequency(note) as f32;
        self.voices.note_on(note.midi(), velocity, Some(freq));
        Ok(())
    }

    /// Releases a note by spelling.
    pub fn note_off_name(&mut self, name: &str) -> Result<(), EngineError> {
        let note = Note::parse(name)?;
        self.voices.note_off(note.midi());
        Ok(())
    }

    /// Triggers a note and places it in the stereo field.
    pub fn note_on_panned(&mut self, note: u8, velocity: f32, pan: f32) {
        self.voices.note_on_panned(note, velocity, pan);
    }

    /// Pans a currently sounding note.
    pub fn set_note_pan(&mut self, note: u8, pan: f32) {
        self.voices.set_note_pan(note, pan);
    }

    /// Silences and deallocates every voice.
    pub fn all_notes_off(&mut self) {
        self.voices.reset();
    }

    // --- Master voice parameters --------------------------------------

    /// Sets the ADSR envelope on every voice. Times are in seconds,
    /// clamped to ≥ 1 ms; sustain is clamped to `[0, 1]`.
    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.set_attack(attack);
        self.set_decay(decay);
        self.set_sustain(sustain);
        self.set_release(release);
    }

    /// Sets the envelope attack time in seconds, clamped to ≥ 1 ms.
    pub fn set_attack(&mut self, seconds: f32) {
        let seconds = seconds.max(0.001);
        self.params.attack = seconds;
        for voice in self.voices.voices_mut() {
            voice.envelope_mut().set_attack_time(seconds);
        }
    }

    /// Sets the envelope decay time in seconds, clamped to ≥ 1 ms.
    pub fn set_decay(&mut self, seconds: f32) {
        let seconds = seconds.max(0.001);
        self.params.decay = seconds;
        for voice in self.voices.voices_mut() {
            voice.envelope_mut().set_decay_time(seconds);
        }
    }

    /// Sets the envelope sustain level, clamped to `[0, 1]`.
    pub fn set_sustain(&mut self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        self.params.sustain = level;
        for voice in self.voices.voices_mut() {
            voice.envelope_mut().set_sustain_level(level);
        }
    }

    /// Sets the envelope release time in seconds, clamped to ≥ 1 ms.
    pub fn set_release(&mut self, seconds: f32) {
        let seconds = seconds.max(0.001);
        self.params.release = seconds;
        for voice in self.voices.voices_mut() {
            voice.envelope_mut().set_release_time(seconds);
        }
    }

    /// Sets the filter base cutoff on every voice, clamped to
    /// `[20, 20000]` Hz.
    pub fn set_cutoff(&mut self, hz: f32) {
        let hz = hz.clamp(20.0, 20_000.0);
        self.params.cutoff = hz;
        for voice in self.voices.voices_mut() {
            voice.set_cutoff(hz);
        }
    }

    /// Sets the filter base resonance on every voice, clamped to
    /// `[0, 0.99]`.
    pub fn set_resonance(&mut self, resonance: f32) {
        let resonance = resonance.clamp(0.0, 0.99);
        self.params.resonance = resonance;
        for voice in self.voices.voices_mut() {
            voice.set_resonance(resonance);
        }
    }

    /// Sets one mixer channel's gain on every voice. The external channel
    /// is live-input plumbing and is not persisted.
    pub fn set_source_gain(&mut self, channel: SourceChannel, gain: f32) {
        let gain = gain.max(0.0);
        match channel {
            SourceChannel::Saw => self.params.gain_saw = gain,
            SourceChannel::Pulse => self.params.gain_pulse = gain,
            SourceChannel::Sub => self.params.gain_sub = gain,
            SourceChannel::Noise => self.params.gain_noise = gain,
            SourceChannel::External => {}
        }
        for voice in self.voices.voices_mut() {
            voice.set_source_gain(channel, gain);
        }
    }

    /// Sets the pulse width on every voice, clamped to `[0.01, 0.99]`.
    pub fn set_pulse_width(&mut self, width: f32) {
        let width = width.clamp(0.01, 0.99);
        self.params.pulse_width = width;
        for voice in self.voices.voices_mut() {
            voice.set_pulse_width(width);
        }
    }

    /// Sets the master gain on the voice sum.
    pub fn set_master_gain(&mut self, gain: f32) {
        let gain = gain.max(0.0);
        self.params.master_gain = gain;
        self.voices.set_master_gain(gain);
    }

    /// Sets a parameter by symbolic name, clamping into its valid range.
    /// Unknown names return an error with no state change.
    pub fn set_parameter(&mut self, name: &str, value: f32) -> Result<(), EngineError> {
        match name {
            "cutoff" => self.set_cutoff(value),
            "resonance" => self.set_resonance(value),
            "attack" => self.set_attack(value),
            "decay" => self.set_decay(value),
            "sustain" => self.set_sustain(value),
            "release" => self.set_release(value),
            "pulse_width" => self.set_pulse_width(value),
            "gain_saw" => self.set_source_gain(SourceChannel::Saw, value),
            "gain_pulse" => self.set_source_gain(SourceChannel::Pulse, value),
            "gain_sub" => self.set_source_gain(SourceChannel::Sub, value),
            "gain_noise" => self.set_source_gain(SourceChannel::Noise, value),
            "master_gain" => self.set_master_gain(value),
            _ => return Err(EngineError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    /// Looks a parameter up by symbolic name.
    pub fn get_parameter(&self, name: &str) -> Result<f32, EngineError> {
        self.params.get(name)
    }

    // --- Modulation ----------------------------------------------------

    /// Adds or updates a modulation connection on every voice.
    pub fn set_modulation(&mut self, source: ModSource, target: ModTarget, intensity: f32) {
        for voice in self.voices.voices_mut() {
            voice.set_modulation(source, target, intensity);
        }
    }

    /// Removes a modulation connection from every voice.
    pub fn clear_modulation(&mut self, source: ModSource, target: ModTarget) {
        for voice in self.voices.voices_mut() {
            voice.clear_modulation(source, target);
        }
    }

    /// Removes every modulation connection from every voice. The default
    /// `Envelope → Amplitude` connection returns on the next note-on.
    pub fn clear_all_modulations(&mut self) {
        for voice in self.voices.voices_mut() {
            voice.clear_all_modulations();
        }
    }

    // --- Musical time --------------------------------------------------

    /// Sets the tempo. The clock anchors, so position is continuous
    /// across the change.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.clock.set_bpm(bpm);
    }

    /// Current tempo.
    pub fn bpm(&self) -> f64 {
        self.clock.bpm()
    }

    /// Sets the meter (beats per bar).
    pub fn set_meter(&mut self, beats_per_bar: i32) {
        self.clock.set_meter(beats_per_bar);
    }

    /// Current bar/beat/tick position.
    pub fn musical_time(&self) -> MusicalTime {
        self.clock.current_time()
    }

    /// Changes the sample rate everywhere: settings, clock, voices.
    /// Must be called outside block renders.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        AudioSettings::global().set_sample_rate(sample_rate);
        self.clock.set_sample_rate(f64::from(sample_rate));
        self.voices.set_sample_rate(sample_rate as f32);
    }

    // --- Patches -------------------------------------------------------

    /// Snapshots the engine's parameters and modulation routing into a
    /// named patch.
    pub fn to_patch(&self, name: impl Into<String>) -> Patch {
        let mut patch = Patch::new(name);
        for (param, value) in self.params.entries() {
            patch.parameters.insert(param.to_string(), value);
        }
        // All voices share one routing configuration; the first voice's
        // matrix is the canonical copy.
        for conn in self.voices.slots()[0].voice().matrix().connections() {
            patch.modulations.push(PatchConnection {
                source: conn.source as u8,
                target: conn.target as u8,
                intensity: conn.intensity,
            });
        }
        patch
    }

    /// Applies a patch through the same symbolic-name setters the control
    /// surface uses. The patch is validated before anything is applied,
    /// so a bad patch leaves the engine unchanged.
    pub fn apply_patch(&mut self, patch: &Patch) -> Result<(), PatchError> {
        for name in patch.parameters.keys() {
            if !ParamSet::contains(name) {
                return Err(PatchError::UnknownParameter(name.clone()));
            }
        }
        let mut routes = Vec::with_capacity(patch.modulations.len());
        for conn in &patch.modulations {
            let source = ModSource::try_from(conn.source);
            let target = ModTarget::try_from(conn.target);
            match (source, target) {
                (Ok(source), Ok(target)) => routes.push((source, target, conn.intensity)),
                _ => {
                    return Err(PatchError::InvalidRoute {
                        source_id: conn.source,
                        target: conn.target,
                    })
                }
            }
        }

        for (name, value) in &patch.parameters {
            self.set_parameter(name, *value)
                .map_err(|_| PatchError::UnknownParameter(name.clone()))?;
        }
        self.clear_all_modulations();
        for (source, target, intensity) in routes {
            self.set_modulation(source, target, intensity);
        }
        log::debug!("applied patch '{}'", patch.name);
        Ok(())
    }

    /// Saves the current state to a patch file.
    pub fn save_patch(
        &self,
        name: impl Into<String>,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), PatchError> {
        self.to_patch(name).save(path)
    }

    /// Loads and applies a patch file.
    pub fn load_patch(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), PatchError> {
        let path = path.as_ref();
        let patch = Patch::load(path)?;
        self.apply_patch(&patch).inspect_err(|err| {
            log::warn!("rejected patch '{}': {err}", path.display());
        })
    }

    // --- Inspection ----------------------------------------------------

    /// The voice pool (tests and host diagnostics).
    pub fn voices(&self) -> &VoiceManager<MAX_VOICES> {
        &self.voices
    }

    /// Number of voices currently producing sound.
    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }

    /// Pushes the full parameter snapshot into every voice.
    fn apply_params(&mut self) {
        let params = self.params.clone();
        for voice in self.voices.voices_mut() {
            voice.set_cutoff(params.cutoff);
            voice.set_resonance(params.resonance);
            voice.set_pulse_width(params.pulse_width);
            voice.set_source_gain(SourceChannel::Saw, params.gain_saw);
            voice.set_source_gain(SourceChannel::Pulse, params.gain_pulse);
            voice.set_source_gain(SourceChannel::Sub, params.gain_sub);
            voice.set_source_gain(SourceChannel::Noise, params.gain_noise);
            let env = voice.envelope_mut();
            env.set_attack_time(params.attack);
            env.set_decay_time(params.decay);
            env.set_sustain_level(params.sustain);
            env.set_release_time(params.release);
        }
        self.voices.set_master_gain(params.master_gain);
    }
}
