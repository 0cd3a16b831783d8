use crate::registers::{
    Registers, REG_HERO_ACTION, REG_HERO_ACTION_POS_MASK, REG_HERO_POS_JUMP_DOWN,
    REG_HERO_POS_LEFT_RIGHT, REG_HERO_POS_MASK, REG_HERO_POS_UP_DOWN, REG_INPUT_KEY,
};

pub const DPAD_RIGHT: u8 = 0x01;
pub const DPAD_LEFT: u8 = 0x02;
pub const DPAD_DOWN: u8 = 0x04;
pub const DPAD_UP: u8 = 0x08;
pub const DPAD_BUTTON: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    fn mask(self) -> u8 {
        match self {
            Self::Right => DPAD_RIGHT,
            Self::Left => DPAD_LEFT,
            Self::Down => DPAD_DOWN,
            Self::Up => DPAD_UP,
        }
    }
}

/// Latched player input, sampled into the input registers once per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    mask: u8,
    horizontal: i16,
    vertical: i16,
    button: bool,
    typed: u8,
    pub quit: bool,
    pub paused: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, dir: Direction) {
        self.mask |= dir.mask();
        self.recompute_axes();
    }

    pub fn release(&mut self, dir: Direction) {
        self.mask &= !dir.mask();
        self.recompute_axes();
    }

    pub fn set_button(&mut self, pressed: bool) {
        self.button = pressed;
        if pressed {
            self.mask |= DPAD_BUTTON;
        } else {
            self.mask &= !DPAD_BUTTON;
        }
    }

    /// Queue a typed character for the password screen. Letters are upper-cased.
    pub fn type_char(&mut self, ch: u8) {
        self.typed = ch.to_ascii_uppercase();
    }

    pub fn typed(&self) -> u8 {
        self.typed
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn is_idle(&self) -> bool {
        self.quit || self.paused
    }

    fn recompute_axes(&mut self) {
        self.horizontal = 0;
        self.vertical = 0;
        if self.mask & DPAD_RIGHT != 0 {
            self.horizontal = 1;
        }
        if self.mask & DPAD_LEFT != 0 {
            self.horizontal = -1;
        }
        if self.mask & DPAD_DOWN != 0 {
            self.vertical = 1;
        }
        if self.mask & DPAD_UP != 0 {
            self.vertical = -1;
        }
    }

    /// Copy the latched state into the reserved registers and consume the typed character.
    pub fn capture(&mut self, regs: &mut Registers) {
        regs.set(REG_INPUT_KEY, 0);
        regs.set(REG_HERO_POS_LEFT_RIGHT, self.horizontal as u16);
        regs.set(REG_HERO_POS_UP_DOWN, self.vertical as u16);
        regs.set(REG_HERO_POS_JUMP_DOWN, self.vertical as u16);
        regs.set(REG_HERO_POS_MASK, self.mask as u16);
        regs.set(REG_HERO_ACTION, self.button as u16);
        regs.set(REG_HERO_ACTION_POS_MASK, self.mask as u16);
        if self.typed != 0 {
            regs.set(REG_INPUT_KEY, self.typed as u16);
            self.typed = 0;
        }
    }
}
