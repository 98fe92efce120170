//! Polyphonic voice allocation and the stereo sum.
//!
//! The manager maps MIDI pitches onto a fixed pool of voices, renders the
//! active ones into pooled scratch, and sums them under a master gain.
//!
//! Allocation on note-on: retrigger in place if the pitch is already
//! sounding; otherwise claim an idle slot; otherwise steal — a releasing
//! voice first (it is already fading and least disruptive), else the
//! least-recently-triggered (oldest notes give way so the musical
//! foreground survives). Slots are reclaimed lazily: a voice whose
//! envelope terminated is noticed by the next render pass.

use calliope_core::{AudioBuffer, AudioLogger, BufferPool, MidiEvent, Processor};

use crate::voice::Voice;

/// Default master gain applied to the voice sum.
const MASTER_GAIN: f32 = 0.2;

/// MIDI note to frequency in 12-TET (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * libm::powf(2.0, (f32::from(note) - 69.0) / 12.0)
}

/// One slot of the pool: a voice plus allocation bookkeeping.
#[derive(Debug)]
pub struct VoiceSlot {
    voice: Voice,
    current_note: Option<u8>,
    active: bool,
    last_note_on_time: u64,
}

impl VoiceSlot {
    /// The pitch this slot is sounding, if any.
    pub fn current_note(&self) -> Option<u8> {
        self.current_note
    }

    /// Whether the slot is allocated (may still be true through the
    /// release tail, until the render pass reclaims it).
    pub fn is_allocated(&self) -> bool {
        self.active
    }

    /// Allocation timestamp used for LRU stealing.
    pub fn last_note_on_time(&self) -> u64 {
        self.last_note_on_time
    }

    /// The slot's voice.
    pub fn voice(&self) -> &Voice {
        &self.voice
    }
}

/// Fixed-pool polyphonic allocator and summer.
pub struct VoiceManager<const N: usize> {
    slots: [VoiceSlot; N],
    /// O(1) pitch → slot lookup. At most one slot per pitch.
    note_to_slot: [Option<usize>; 128],
    timestamp_counter: u64,
    master_gain: f32,
    pool: BufferPool,
    sample_rate: f32,
}

impl<const N: usize> VoiceManager<N> {
    /// Creates a manager with `N` voices and scratch blocks of
    /// `block_frames`.
    pub fn new(sample_rate: f32, block_frames: usize) -> Self {
        Self {
            slots: core::array::from_fn(|_| VoiceSlot {
                voice: Voice::new(sample_rate),
                current_note: None,
                active: false,
                last_note_on_time: 0,
            }),
            note_to_slot: [None; 128],
            timestamp_counter: 0,
            master_gain: MASTER_GAIN,
            pool: BufferPool::new(block_frames),
            sample_rate,
        }
    }

    /// Triggers a note. `frequency` overrides the 12-TET pitch mapping
    /// when the caller (e.g. an alternate tuning) has already computed it.
    pub fn note_on(&mut self, note: u8, velocity: f32, frequency: Option<f32>) {
        let note = note & 0x7F;
        let freq = match frequency {
            Some(hz) if hz > 0.0 => hz,
            _ => midi_note_to_freq(note),
        };

        // Already sounding: retrigger in place.
        if let Some(idx) = self.note_to_slot[note as usize] {
            let slot = &mut self.slots[idx];
            if slot.active && slot.current_note == Some(note) {
                slot.last_note_on_time = next_timestamp(&mut self.timestamp_counter);
                slot.voice.note_on(freq, velocity);
                return;
            }
        }

        // An idle voice, if any.
        if let Some(idx) = self.slots.iter().position(|s| !s.voice.is_active()) {
            self.claim(idx, note, freq, velocity);
            return;
        }

        // Steal: releasing first, then least recently triggered.
        let candidate = self
            .slots
            .iter()
            .position(|s| s.voice.is_releasing())
            .unwrap_or_else(|| {
                self.slots
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, s)| s.last_note_on_time)
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            });

        let displaced = self.slots[candidate].current_note;
        AudioLogger::global().log_event(
            "VoiceSteal",
            displaced.map_or(-1.0, f32::from),
        );
        if let Some(old) = displaced {
            self.note_to_slot[old as usize] = None;
        }

        self.slots[candidate].voice.reset();
        self.slots[candidate].voice.set_pan(0.0);
        self.claim(candidate, note, freq, velocity);
    }

    /// Triggers a note and places it in the stereo field.
    pub fn note_on_panned(&mut self, note: u8, velocity: f32, pan: f32) {
        self.note_on(note, velocity, None);
        self.set_note_pan(note, pan);
    }

    /// Pans a currently sounding note. Unknown pitches are a no-op.
    pub fn set_note_pan(&mut self, note: u8, pan: f32) {
        let note = note & 0x7F;
        if let Some(idx) = self.note_to_slot[note as usize] {
            let slot = &mut self.slots[idx];
            if slot.active && slot.current_note == Some(note) {
                slot.voice.set_pan(pan);
            }
        }
    }

    /// Releases a note. The slot stays allocated until the envelope
    /// terminates and the next render observes it. Unknown pitches are a
    /// no-op.
    pub fn note_off(&mut self, note: u8) {
        let note = note & 0x7F;
        if let Some(idx) = self.note_to_slot[note as usize] {
            let slot = &mut self.slots[idx];
            if slot.active && slot.current_note == Some(note) {
                slot.voice.note_off();
                self.note_to_slot[note as usize] = None;
            }
        }
    }

    /// Dispatches a parsed MIDI event. Note on/off drive the allocator;
    /// channel aftertouch updates the sounding voices' modulation source;
    /// everything else is ignored here.
    pub fn handle_midi_event(&mut self, event: &MidiEvent) {
        if event.is_note_on() {
            self.note_on(event.data1, f32::from(event.data2) / 127.0, None);
        } else if event.is_note_off() {
            self.note_off(event.data1);
        } else if event.is_channel_aftertouch() {
            let pressure = f32::from(event.data1) / 127.0;
            for slot in self.slots.iter_mut().filter(|s| s.active) {
                slot.voice.set_aftertouch(pressure);
            }
        }
    }

    /// Silences and deallocates everything.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.voice.reset();
            slot.current_note = None;
            slot.active = false;
            slot.last_note_on_time = 0;
        }
        self.note_to_slot = [None; 128];
        self.timestamp_counter = 0;
    }

    /// The slot table (inspection and tests).
    pub fn slots(&self) -> &[VoiceSlot; N] {
        &self.slots
    }

    /// Slot index currently holding a pitch, if any.
    pub fn slot_for_note(&self, note: u8) -> Option<usize> {
        self.note_to_slot[(note & 0x7F) as usize]
    }

    /// Number of slots whose voices are still producing sound.
    pub fn active_voice_count(&self) -> usize {
        self.slots.iter().filter(|s| s.voice.is_active()).count()
    }

    /// Iterates every voice mutably (parameter fan-out from the facade).
    pub fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots.iter_mut().map(|s| &mut s.voice)
    }

    /// Sets the master gain applied to the summed output.
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.max(0.0);
    }

    /// Current master gain.
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Sample rate the voices run at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Propagates a sample-rate change to every voice.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for slot in &mut self.slots {
            slot.voice.set_sample_rate(sample_rate);
        }
    }

    fn claim(&mut self, idx: usize, note: u8, freq: f32, velocity: f32) {
        let timestamp = next_timestamp(&mut self.timestamp_counter);
        let slot = &mut self.slots[idx];
        slot.current_note = Some(note);
        slot.active = true;
        slot.last_note_on_time = timestamp;
        self.note_to_slot[note as usize] = Some(idx);
        slot.voice.note_on(freq, velocity);
    }

    /// Reclaims a slot whose envelope has terminated.
    fn release_slot(slot: &mut VoiceSlot, note_to_slot: &mut [Option<usize>; 128], idx: usize) {
        slot.active = false;
        if let Some(note) = slot.current_note {
            if note_to_slot[note as usize] == Some(idx) {
                note_to_slot[note as usize] = None;
            }
        }
        slot.current_note = None;
    }
}

fn next_timestamp(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl<const N: usize> Processor for VoiceManager<N> {
    fn pull(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        let frames = output.len();

        let Self {
            slots,
            note_to_slot,
            pool,
            master_gain,
            ..
        } = self;
        let mut scratch = pool.borrow(frames);

        for (idx, slot) in slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            if slot.voice.is_active() {
                let span = &mut scratch.block().left[..frames];
                slot.voice.pull(span);
                for (out, voice_sample) in output.iter_mut().zip(span.iter()) {
                    *out += *voice_sample;
                }
            } else {
                Self::release_slot(slot, note_to_slot, idx);
            }
        }

        for sample in output.iter_mut() {
            *sample *= *master_gain;
        }
    }

    fn pull_stereo(&mut self, output: &mut AudioBuffer<'_>) {
        output.clear();
        let frames = output.frames();

        let Self {
            slots,
            note_to_slot,
            pool,
            master_gain,
            ..
        } = self;
        let mut scratch = pool.borrow(frames);

        for (idx, slot) in slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            if slot.voice.is_active() {
                let mut voice_buf = scratch.block().as_buffer(frames);
                slot.voice.pull_stereo(&mut voice_buf);
                output.accumulate(&voice_buf);
            } else {
                Self::release_slot(slot, note_to_slot, idx);
            }
        }

        output.scale(*master_gain);
    }

    fn reset(&mut self) {
        VoiceManager::reset(self);
    }
}
