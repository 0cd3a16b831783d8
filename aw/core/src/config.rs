use crate::palette::PaletteMode;
use crate::parts::GamePart;
use crate::registers::ResetProfile;
use crate::strings::Language;
use crate::timer::DEFAULT_FRAME_SLICE_MS;
use crate::vm::DEFAULT_INSTRUCTION_BUDGET;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine settings read from a JSON file. Every field has a default, so an
/// empty object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub palette_mode: PaletteMode,
    pub start_part: GamePart,
    pub language: Language,
    pub bypass_protection: bool,
    pub out_of_this_world: bool,
    pub frame_slice_ms: u32,
    pub instruction_budget: u32,
    /// Seed for the random register; taken from the wall clock when absent.
    pub random_seed: Option<u16>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            palette_mode: PaletteMode::default(),
            start_part: GamePart::default(),
            language: Language::default(),
            bypass_protection: true,
            out_of_this_world: false,
            frame_slice_ms: DEFAULT_FRAME_SLICE_MS,
            instruction_budget: DEFAULT_INSTRUCTION_BUDGET,
            random_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn reset_profile(&self) -> ResetProfile {
        ResetProfile {
            out_of_this_world: self.out_of_this_world,
            bypass_protection: self.bypass_protection,
        }
    }
}
