use serde::{Deserialize, Serialize};

pub const PART_FIRST_ID: u16 = 0x3E80;
pub const PART_LAST_ID: u16 = 0x3E89;

/// Resource ids that make up one part. A zero id means the part has no such segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpec {
    pub label: &'static str,
    pub palettes: u8,
    pub bytecode: u8,
    pub polygon1: u8,
    pub polygon2: u8,
}

/// Chapters of the game. Loading resource id `0x3E80 + n` switches to part `n`.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePart {
    Protection,
    #[default]
    Introduction,
    Water,
    Jail,
    City,
    Arena,
    Luxury,
    Final,
    Password,
    /// Second copy of the password screen, selected by its own id.
    PasswordAlt,
}

impl GamePart {
    pub const ALL: [Self; 10] = [
        Self::Protection,
        Self::Introduction,
        Self::Water,
        Self::Jail,
        Self::City,
        Self::Arena,
        Self::Luxury,
        Self::Final,
        Self::Password,
        Self::PasswordAlt,
    ];

    pub fn id(self) -> u16 {
        PART_FIRST_ID + self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        if !(PART_FIRST_ID..=PART_LAST_ID).contains(&id) {
            return None;
        }
        Some(Self::ALL[(id - PART_FIRST_ID) as usize])
    }

    pub fn spec(self) -> PartSpec {
        let (label, palettes, bytecode, polygon1, polygon2) = match self {
            Self::Protection => ("protection", 0x14, 0x15, 0x16, 0x00),
            Self::Introduction => ("introduction", 0x17, 0x18, 0x19, 0x00),
            Self::Water => ("water", 0x1A, 0x1B, 0x1C, 0x11),
            Self::Jail => ("jail", 0x1D, 0x1E, 0x1F, 0x11),
            Self::City => ("city", 0x20, 0x21, 0x22, 0x11),
            Self::Arena => ("arena", 0x23, 0x24, 0x25, 0x00),
            Self::Luxury => ("luxury", 0x26, 0x27, 0x28, 0x11),
            Self::Final => ("final", 0x29, 0x2A, 0x2B, 0x11),
            Self::Password | Self::PasswordAlt => ("password", 0x7D, 0x7E, 0x7F, 0x00),
        };
        PartSpec {
            label,
            palettes,
            bytecode,
            polygon1,
            polygon2,
        }
    }

    /// Non-zero resource ids of the part, in load order.
    pub fn resource_ids(self) -> impl Iterator<Item = u8> {
        let spec = self.spec();
        [spec.palettes, spec.bytecode, spec.polygon1, spec.polygon2]
            .into_iter()
            .filter(|&id| id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_map_both_ways() {
        for part in GamePart::ALL {
            assert_eq!(GamePart::from_id(part.id()), Some(part));
        }
        assert_eq!(GamePart::Water.id(), 0x3E82);
        assert_eq!(GamePart::from_id(0x3E7F), None);
        assert_eq!(GamePart::from_id(0x3E8A), None);
    }

    #[test]
    fn cinematic_parts_have_no_shared_bank() {
        assert_eq!(GamePart::Introduction.resource_ids().count(), 3);
        assert_eq!(
            GamePart::Water.resource_ids().collect::<Vec<_>>(),
            vec![0x1A, 0x1B, 0x1C, 0x11]
        );
    }
}
