use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const PALETTE_COUNT: usize = 32;
pub const PALETTE_COLORS: usize = 16;
/// Bytes of one complete palette set (32 palettes of 16 big-endian words).
pub const PALETTE_SET_SIZE: usize = PALETTE_COUNT * PALETTE_COLORS * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Expand a 12-bit `0x0RGB` word, duplicating each nibble.
    pub fn from_word(word: u16) -> Self {
        let r = ((word >> 8) & 0x0F) as u8;
        let g = ((word >> 4) & 0x0F) as u8;
        let b = (word & 0x0F) as u8;
        Self::new(r * 0x11, g * 0x11, b * 0x11)
    }
}

pub type Palette = [Rgb; PALETTE_COLORS];

/// Which part of a palette resource is decoded and how.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteMode {
    /// First set, 12-bit colors.
    #[default]
    Rgb,
    /// Second set, 12-bit colors.
    RgbAlt,
    /// Second set, top nibble indexing the VGA 16-color table.
    Vga,
    Ega,
    Cga,
}

impl PaletteMode {
    pub fn next(self) -> Self {
        match self {
            Self::Rgb => Self::RgbAlt,
            Self::RgbAlt => Self::Vga,
            Self::Vga => Self::Ega,
            Self::Ega => Self::Cga,
            Self::Cga => Self::Rgb,
        }
    }

    fn offset(self) -> usize {
        match self {
            Self::Rgb => 0,
            _ => PALETTE_SET_SIZE,
        }
    }

    fn decode(self, word: u16) -> Rgb {
        let index = ((word >> 12) & 0x0F) as usize;
        match self {
            Self::Rgb | Self::RgbAlt => Rgb::from_word(word),
            Self::Vga => VGA[index],
            Self::Ega => EGA[index],
            Self::Cga => CGA[index],
        }
    }
}

const VGA: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x00, 0x00, 0x80),
    Rgb::new(0x00, 0x80, 0x00),
    Rgb::new(0x00, 0x80, 0x80),
    Rgb::new(0x80, 0x00, 0x00),
    Rgb::new(0x80, 0x00, 0x80),
    Rgb::new(0x80, 0x80, 0x00),
    Rgb::new(0x80, 0x80, 0x80),
    Rgb::new(0xC0, 0xC0, 0xC0),
    Rgb::new(0x00, 0x00, 0xFF),
    Rgb::new(0x00, 0xFF, 0x00),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x00, 0x00),
    Rgb::new(0xFF, 0x00, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x00),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

const EGA: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x00, 0x00, 0xAA),
    Rgb::new(0x00, 0xAA, 0x00),
    Rgb::new(0x00, 0xAA, 0xAA),
    Rgb::new(0xAA, 0x00, 0x00),
    Rgb::new(0xAA, 0x00, 0xAA),
    Rgb::new(0xAA, 0x55, 0x00),
    Rgb::new(0xAA, 0xAA, 0xAA),
    Rgb::new(0x55, 0x55, 0x55),
    Rgb::new(0x55, 0x55, 0xFF),
    Rgb::new(0x55, 0xFF, 0x55),
    Rgb::new(0x55, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x55, 0x55),
    Rgb::new(0xFF, 0x55, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x55),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

// The CGA table only has four distinct hues per intensity.
const CGA: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x00, 0xAA, 0xAA),
    Rgb::new(0x00, 0xAA, 0xAA),
    Rgb::new(0x00, 0xAA, 0xAA),
    Rgb::new(0xAA, 0x00, 0xAA),
    Rgb::new(0xAA, 0x00, 0xAA),
    Rgb::new(0xAA, 0x00, 0xAA),
    Rgb::new(0xAA, 0xAA, 0xAA),
    Rgb::new(0x55, 0x55, 0x55),
    Rgb::new(0x55, 0xFF, 0xFF),
    Rgb::new(0x55, 0xFF, 0xFF),
    Rgb::new(0x55, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x55, 0xFF),
    Rgb::new(0xFF, 0x55, 0xFF),
    Rgb::new(0xFF, 0x55, 0xFF),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

/// Decode all 32 palettes of a part. A resource too short for the selected
/// mode leaves every palette black.
pub fn decode_palettes(data: &[u8], mode: PaletteMode) -> [Palette; PALETTE_COUNT] {
    let mut palettes = [[Rgb::default(); PALETTE_COLORS]; PALETTE_COUNT];
    let start = mode.offset();
    let Some(set) = data.get(start..start + PALETTE_SET_SIZE) else {
        warn!(
            len = data.len(),
            ?mode,
            "palette resource too short for mode"
        );
        return palettes;
    };
    debug!(?mode, "decoding palettes");
    for (palette, chunk) in palettes
        .iter_mut()
        .zip(set.chunks_exact(PALETTE_COLORS * 2))
    {
        for (color, word) in palette.iter_mut().zip(chunk.chunks_exact(2)) {
            *color = mode.decode(u16::from_be_bytes([word[0], word[1]]));
        }
    }
    palettes
}
