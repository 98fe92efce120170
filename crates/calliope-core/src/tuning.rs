//! Note names and tuning systems.
//!
//! [`Note`] wraps a MIDI note number and parses note spellings such as
//! `"A4"`, `"C#3"`, or `"Bb-1"` (letter, optional sharp/flat, signed
//! octave). [`TwelveToneEqual`] maps notes to frequencies in twelve-tone
//! equal temperament around a configurable reference (A4 = MIDI 69 at
//! 440 Hz by default).

use thiserror::Error;

/// Failure to interpret a note spelling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoteParseError {
    /// The input was empty.
    #[error("note name is empty")]
    Empty,
    /// The letter (or letter + accidental) was not a valid pitch class.
    #[error("invalid note letter '{0}'")]
    InvalidLetter(char),
    /// The octave part was missing or not a number.
    #[error("missing or invalid octave in '{0}'")]
    InvalidOctave(String),
    /// The resulting MIDI note fell outside 0..=127.
    #[error("note '{0}' is outside the MIDI range")]
    OutOfRange(String),
}

/// A musical note identified by MIDI number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note(u8);

impl Note {
    /// Wraps a MIDI note number (clamped to 0..=127).
    pub fn from_midi(midi: u8) -> Self {
        Self(midi.min(127))
    }

    /// Parses a spelling such as `"A4"`, `"c#3"`, or `"Bb-1"`.
    ///
    /// MIDI note 0 is C-1, so C4 = 60 and A4 = 69:
    /// `midi = (octave + 1) * 12 + semitone_offset`.
    pub fn parse(name: &str) -> Result<Self, NoteParseError> {
        let mut chars = name.chars();
        let letter = chars.next().ok_or(NoteParseError::Empty)?;

        let offset: i32 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            other => return Err(NoteParseError::InvalidLetter(other)),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') | Some('B') if !rest[1..].is_empty() => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave_str
            .parse()
            .map_err(|_| NoteParseError::InvalidOctave(name.to_string()))?;

        let midi = (octave + 1) * 12 + offset + accidental;
        if !(0..=127).contains(&midi) {
            return Err(NoteParseError::OutOfRange(name.to_string()));
        }
        Ok(Self(midi as u8))
    }

    /// The MIDI note number.
    pub fn midi(&self) -> u8 {
        self.0
    }
}

/// Twelve-tone equal temperament around a reference pitch.
#[derive(Clone, Copy, Debug)]
pub struct TwelveToneEqual {
    reference_hz: f64,
    reference_note: u8,
}

impl TwelveToneEqual {
    /// Creates a tuning with an explicit reference pitch.
    pub fn new(reference_hz: f64, reference_note: u8) -> Self {
        Self {
            reference_hz,
            reference_note,
        }
    }

    /// Frequency of a note: `f_ref * 2^((n - n_ref) / 12)`.
    pub fn frequency(&self, note: Note) -> f64 {
        let semitones = f64::from(note.midi()) - f64::from(self.reference_note);
        self.reference_hz * libm::pow(2.0, semitones / 12.0)
    }
}

impl Default for TwelveToneEqual {
    /// A4 = MIDI 69 at 440 Hz.
    fn default() -> Self {
        Self::new(440.0, 69)
    }
}
