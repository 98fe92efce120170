//! Patch persistence.
//!
//! Patches are human-readable JSON with two sections: a map of parameter
//! names to float values and a list of modulation connections (enums
//! serialized as integers). Parameters use a `BTreeMap` and the
//! serializer is deterministic, so saving, loading, and saving again
//! yields byte-identical output.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PatchError;

/// Current patch format version.
pub const PATCH_VERSION: u32 = 1;

/// One serialized modulation route; `source` and `target` carry the enum
/// discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchConnection {
    /// [`calliope_synth::ModSource`] discriminant.
    pub source: u8,
    /// [`calliope_synth::ModTarget`] discriminant.
    pub target: u8,
    /// Bipolar intensity.
    pub intensity: f32,
}

/// The full persisted state of a synth patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Format version.
    pub version: u32,
    /// Patch display name.
    pub name: String,
    /// Parameter name → value map, keyed by the engine's symbolic names.
    pub parameters: BTreeMap<String, f32>,
    /// Active modulation connections.
    #[serde(default)]
    pub modulations: Vec<PatchConnection>,
}

impl Patch {
    /// Creates an empty patch with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: PATCH_VERSION,
            name: name.into(),
            parameters: BTreeMap::new(),
            modulations: Vec::new(),
        }
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PatchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a patch from JSON.
    pub fn from_json(json: &str) -> Result<Self, PatchError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the patch to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| PatchError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads a patch from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PatchError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
