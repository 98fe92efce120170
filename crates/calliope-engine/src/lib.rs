//! Calliope Engine - the synthesizer's host-facing facade
//!
//! [`Engine`] binds the voice manager, musical clock, MIDI parser, and
//! tuning system under the host's block-callback contract:
//!
//! ```rust
//! use calliope_engine::Engine;
//!
//! let mut engine = Engine::new(48_000);
//! engine.note_on_name("A4", 1.0).unwrap();
//!
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! engine.render(&mut left, &mut right);
//! ```
//!
//! Control threads talk to the engine through typed setters, symbolic
//! parameter names, and JSON patch files; the audio thread only ever
//! calls [`Engine::render`] (or [`Engine::render_mono`]) and
//! [`Engine::submit_midi`].

pub mod engine;
pub mod error;
pub mod params;
pub mod patch;

pub use engine::Engine;
pub use error::{EngineError, PatchError};
pub use params::ParamSet;
pub use patch::{Patch, PatchConnection};
