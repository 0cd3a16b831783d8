use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};

pub const REGISTER_COUNT: usize = 256;
pub const STACK_DEPTH: usize = 256;

/// First of the four code-wheel symbols the expected answer is kept in.
pub const REG_CODE_ANSWER: u8 = 0x1E;
/// First of the four code-wheel symbols the player entered.
pub const REG_CODE_ENTERED: u8 = 0x29;
pub const REG_CODE_ATTEMPTS: u8 = 0x32;
pub const REG_RANDOM_SEED: u8 = 0x3C;
pub const REG_CODE_TIMER: u8 = 0x64;
pub const REG_GAME_VARIANT: u8 = 0x54;
pub const REG_PROTECTION_1: u8 = 0xBC;
pub const REG_PROTECTION_2: u8 = 0xC6;
pub const REG_INPUT_KEY: u8 = 0xDA;
pub const REG_PROTECTION_3: u8 = 0xDC;
pub const REG_DOS_VERSION: u8 = 0xE4;
pub const REG_HERO_POS_UP_DOWN: u8 = 0xE5;
pub const REG_PROTECTION_4: u8 = 0xF2;
pub const REG_SCROLL_Y: u8 = 0xF9;
pub const REG_HERO_ACTION: u8 = 0xFA;
pub const REG_HERO_POS_JUMP_DOWN: u8 = 0xFB;
pub const REG_HERO_POS_LEFT_RIGHT: u8 = 0xFC;
pub const REG_HERO_POS_MASK: u8 = 0xFD;
pub const REG_HERO_ACTION_POS_MASK: u8 = 0xFE;
pub const REG_PAUSE_SLICES: u8 = 0xFF;

/// Values written by a power-on reset besides the random seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetProfile {
    /// Selects the US release (`Out Of This World`) instead of the European one.
    pub out_of_this_world: bool,
    pub bypass_protection: bool,
}

/// The 256 script variables. Indexing by `u8` can never go out of range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    values: [u16; REGISTER_COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            values: [0; REGISTER_COUNT],
        }
    }
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, index: u8) -> u16 {
        self.values[index as usize]
    }

    #[inline]
    pub fn get_signed(&self, index: u8) -> i16 {
        self.values[index as usize] as i16
    }

    #[inline]
    pub fn set(&mut self, index: u8, value: u16) {
        self.values[index as usize] = value;
    }

    pub fn as_slice(&self) -> &[u16; REGISTER_COUNT] {
        &self.values
    }

    pub fn load(&mut self, values: &[u16]) -> Result<()> {
        if values.len() != REGISTER_COUNT {
            return Err(CoreError::InvalidSnapshot(format!(
                "register bank length mismatch (expected {REGISTER_COUNT}, got {})",
                values.len()
            )));
        }
        self.values.copy_from_slice(values);
        Ok(())
    }

    /// Zero every variable, then apply the seed and release constants.
    pub fn reset(&mut self, seed: u16, profile: ResetProfile) {
        self.values = [0; REGISTER_COUNT];
        self.set(REG_RANDOM_SEED, seed);
        self.set(REG_DOS_VERSION, 0x14);
        self.set(
            REG_GAME_VARIANT,
            if profile.out_of_this_world { 0x81 } else { 0x01 },
        );
        if profile.bypass_protection {
            self.set(REG_PROTECTION_1, 0x10);
            self.set(REG_PROTECTION_2, 0x80);
            self.set(REG_PROTECTION_3, 0x21);
            self.set(REG_PROTECTION_4, 0x0FA0);
        }
    }
}

/// Bounded return-address stack shared by all threads within a tick.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallStack {
    entries: Vec<u16>,
}

impl Default for CallStack {
    fn default() -> Self {
        Self {
            entries: Vec::with_capacity(STACK_DEPTH),
        }
    }
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, return_pc: u16, pc: u16) -> Result<()> {
        if self.entries.len() >= STACK_DEPTH {
            return Err(CoreError::StackOverflow { pc });
        }
        self.entries.push(return_pc);
        Ok(())
    }

    pub fn pop(&mut self, pc: u16) -> Result<u16> {
        self.entries.pop().ok_or(CoreError::StackUnderflow { pc })
    }

    pub fn entries(&self) -> &[u16] {
        &self.entries
    }
}
