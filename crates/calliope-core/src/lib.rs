//! Calliope Core - pull-model infrastructure for the synthesizer engine
//!
//! This crate provides the building blocks the render pipeline is made of:
//!
//! - [`Processor`] trait for all pull-model units
//! - [`AudioBuffer`] / [`StereoBlock`] stereo block views and storage
//! - [`BufferPool`] for allocation-free scratch blocks on the audio thread
//! - [`AudioSettings`] process-wide negotiated hardware state
//! - [`MusicalClock`] sample-accurate bar/beat/tick tracking
//! - [`AudioLogger`] SPSC ring for real-time telemetry
//! - [`MidiParser`] byte-stream state machine with running status
//! - [`Note`] / [`TwelveToneEqual`] musical tuning
//! - [`AudioGraph`] serial processing chain
//!
//! ## Threading model
//!
//! Everything here is written for a split between one audio thread (the
//! host's block callback) and any number of control threads. The audio
//! thread never allocates, blocks, or takes a contended lock: scratch
//! comes from [`BufferPool`], telemetry goes through the lock-free
//! [`AudioLogger`] ring, and [`AudioSettings`] is plain atomics.

pub mod buffer;
pub mod clock;
pub mod graph;
pub mod logger;
pub mod midi;
pub mod pool;
pub mod processor;
pub mod settings;
pub mod tuning;

// Re-export main types at crate root
pub use buffer::{AudioBuffer, StereoBlock};
pub use clock::{MusicalClock, MusicalTime, PPQ};
pub use graph::AudioGraph;
pub use logger::{AudioLogger, LogEntry, LogEntryKind};
pub use midi::{MidiEvent, MidiParser};
pub use pool::{BufferPool, PooledBlock};
pub use processor::{PerformanceMetrics, Processor};
pub use settings::AudioSettings;
pub use tuning::{Note, NoteParseError, TwelveToneEqual};
