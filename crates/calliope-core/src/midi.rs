//! MIDI 1.0 byte-stream parsing.
//!
//! [`MidiParser`] is a three-state machine that reassembles channel
//! messages from raw bytes, honoring running status (a data byte arriving
//! with no pending status reuses the last status byte seen). System
//! real-time bytes (`0xF8..=0xFF`) are ignored. Completed events are
//! delivered through a caller-supplied callback together with the chunk's
//! sample offset.

/// One assembled MIDI event with its intra-block timestamp.
///
/// The sample offset is carried for logging and future sample-accurate
/// dispatch; the current engine dispatches whole events at block rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    /// Status byte (`0x80..=0xEF` for channel messages).
    pub status: u8,
    /// First data byte.
    pub data1: u8,
    /// Second data byte (0 for one-byte messages).
    pub data2: u8,
    /// Sample offset of the event within the submitting block.
    pub sample_offset: u32,
}

impl MidiEvent {
    /// High nibble of the status byte (message type).
    #[inline]
    pub fn message_type(&self) -> u8 {
        self.status & 0xF0
    }

    /// MIDI channel (0-15).
    #[inline]
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// True for a note-on with non-zero velocity.
    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.message_type() == 0x90 && self.data2 != 0
    }

    /// True for a note-off, including the note-on-with-velocity-zero
    /// convention.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        self.message_type() == 0x80 || (self.message_type() == 0x90 && self.data2 == 0)
    }

    /// True for channel aftertouch (channel pressure).
    #[inline]
    pub fn is_channel_aftertouch(&self) -> bool {
        self.message_type() == 0xD0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParserState {
    WaitingForStatus,
    WaitingForData1,
    WaitingForData2,
}

/// State-machine MIDI parser with running-status support.
#[derive(Debug)]
pub struct MidiParser {
    state: ParserState,
    running_status: u8,
    pending_status: u8,
    pending_data1: u8,
}

impl MidiParser {
    /// Creates a parser in the waiting-for-status state.
    pub fn new() -> Self {
        Self {
            state: ParserState::WaitingForStatus,
            running_status: 0,
            pending_status: 0,
            pending_data1: 0,
        }
    }

    /// Parses a chunk of raw MIDI bytes, invoking `callback` once per
    /// completed event. `sample_offset` is attached to every event from
    /// this chunk.
    pub fn parse(&mut self, data: &[u8], sample_offset: u32, mut callback: impl FnMut(MidiEvent)) {
        for &byte in data {
            if byte >= 0x80 {
                // System real-time bytes may be interleaved anywhere and
                // must not disturb running status.
                if byte >= 0xF8 {
                    continue;
                }
                self.pending_status = byte;
                self.running_status = byte;
                self.state = ParserState::WaitingForData1;
                continue;
            }

            // A data byte with no pending status re-enters via running
            // status if one has been cached.
            if self.state == ParserState::WaitingForStatus && self.running_status != 0 {
                self.pending_status = self.running_status;
                self.state = ParserState::WaitingForData1;
            }

            match self.state {
                ParserState::WaitingForData1 => {
                    self.pending_data1 = byte;
                    if expected_data_bytes(self.pending_status) == 1 {
                        callback(MidiEvent {
                            status: self.pending_status,
                            data1: self.pending_data1,
                            data2: 0,
                            sample_offset,
                        });
                        self.state = ParserState::WaitingForStatus;
                    } else {
                        self.state = ParserState::WaitingForData2;
                    }
                }
                ParserState::WaitingForData2 => {
                    callback(MidiEvent {
                        status: self.pending_status,
                        data1: self.pending_data1,
                        data2: byte,
                        sample_offset,
                    });
                    self.state = ParserState::WaitingForStatus;
                }
                // Unreachable while running_status handling above is
                // intact; a stray data byte with no status is dropped.
                ParserState::WaitingForStatus => {}
            }
        }
    }

    /// Clears parser state, including the running-status register.
    pub fn reset(&mut self) {
        self.state = ParserState::WaitingForStatus;
        self.running_status = 0;
        self.pending_status = 0;
        self.pending_data1 = 0;
    }
}

impl Default for MidiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Expected data-byte count for a status byte's message type.
fn expected_data_bytes(status: u8) -> u8 {
    match status & 0xF0 {
        // Note off, note on, poly aftertouch, control change, pitch bend.
        0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => 2,
        // Program change, channel aftertouch.
        0xC0 | 0xD0 => 1,
        _ => 0,
    }
}
