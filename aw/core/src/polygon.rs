//! Shape descriptors stored in the polygon banks.
//!
//! A descriptor starts with a type byte. Leaves (`0xC0` bits set) carry a
//! bounding box and an even list of vertices; hierarchies (`type & 0x3F == 2`)
//! carry an anchor and a list of children pointing at other descriptors in the
//! same bank.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_POINTS: usize = 50;
/// Zoom value that draws a shape at its stored size.
pub const UNIT_ZOOM: u16 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Problems with a single descriptor. Drawing skips the shape and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("bad polygon type {kind:#04x} at offset {offset:#06x}")]
    BadType { kind: u8, offset: usize },
    #[error("polygon descriptor truncated at offset {offset:#06x}")]
    Truncated { offset: usize },
    #[error("polygon has {count} points (must be even and at most {MAX_POINTS})")]
    BadPointCount { count: u8 },
}

pub(crate) fn scale(value: u8, zoom: u16) -> i16 {
    (value as u32 * zoom as u32 / 64) as i16
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> Result<u8, ShapeError> {
        let value = *self.data.get(self.offset).ok_or(ShapeError::Truncated {
            offset: self.offset,
        })?;
        self.offset += 1;
        Ok(value)
    }

    fn word(&mut self) -> Result<u16, ShapeError> {
        Ok(((self.byte()? as u16) << 8) | self.byte()? as u16)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafShape {
    pub color: u8,
    pub width: u8,
    pub height: u8,
    /// Vertices relative to the top-left of the bounding box, in stored units.
    pub points: Vec<(u8, u8)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef {
    /// Byte offset of the child descriptor inside the bank.
    pub offset: u16,
    pub x: u8,
    pub y: u8,
    /// Color forced onto the child's leaves; `None` lets leaves use their own.
    pub color: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupShape {
    pub anchor_x: u8,
    pub anchor_y: u8,
    pub children: Vec<ChildRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeDescriptor {
    Leaf(LeafShape),
    Group(GroupShape),
}

impl ShapeDescriptor {
    pub fn decode(data: &[u8], offset: usize) -> Result<Self, ShapeError> {
        let mut reader = Reader { data, offset };
        let kind = reader.byte()?;
        if kind & 0xC0 == 0xC0 {
            let width = reader.byte()?;
            let height = reader.byte()?;
            let count = reader.byte()?;
            if count & 1 != 0 || count as usize > MAX_POINTS {
                return Err(ShapeError::BadPointCount { count });
            }
            let mut points = Vec::with_capacity(count as usize);
            for _ in 0..count {
                points.push((reader.byte()?, reader.byte()?));
            }
            return Ok(Self::Leaf(LeafShape {
                color: kind & 0x3F,
                width,
                height,
                points,
            }));
        }
        if kind & 0x3F == 2 {
            let anchor_x = reader.byte()?;
            let anchor_y = reader.byte()?;
            let count = reader.byte()? as usize + 1;
            let mut children = Vec::with_capacity(count);
            for _ in 0..count {
                let word = reader.word()?;
                let x = reader.byte()?;
                let y = reader.byte()?;
                let color = if word & 0x8000 != 0 {
                    Some(((reader.word()? >> 8) & 0x7F) as u8)
                } else {
                    None
                };
                children.push(ChildRef {
                    offset: ((word & 0x7FFF) as u32 * 2) as u16,
                    x,
                    y,
                    color,
                });
            }
            return Ok(Self::Group(GroupShape {
                anchor_x,
                anchor_y,
                children,
            }));
        }
        Err(ShapeError::BadType { kind, offset })
    }

    /// Serialize back to bank bytes. Child offsets must be even.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Leaf(leaf) => {
                out.push(0xC0 | (leaf.color & 0x3F));
                out.extend([leaf.width, leaf.height, leaf.points.len() as u8]);
                for &(x, y) in &leaf.points {
                    out.extend([x, y]);
                }
            }
            Self::Group(group) => {
                out.extend([0x02, group.anchor_x, group.anchor_y]);
                out.push(group.children.len().saturating_sub(1) as u8);
                for child in &group.children {
                    let mut word = (child.offset / 2) & 0x7FFF;
                    if child.color.is_some() {
                        word |= 0x8000;
                    }
                    out.extend(word.to_be_bytes());
                    out.extend([child.x, child.y]);
                    if let Some(color) = child.color {
                        out.extend([color & 0x7F, 0]);
                    }
                }
            }
        }
        out
    }
}

/// A leaf scaled to screen units, ready for the rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    pub bbox_w: u16,
    pub bbox_h: u16,
    count: usize,
    points: [Point; MAX_POINTS],
}

impl Polygon {
    pub fn scaled(leaf: &LeafShape, zoom: u16) -> Self {
        let mut points = [Point::default(); MAX_POINTS];
        for (slot, &(x, y)) in points.iter_mut().zip(&leaf.points) {
            *slot = Point::new(scale(x, zoom), scale(y, zoom));
        }
        Self {
            bbox_w: scale(leaf.width, zoom) as u16,
            bbox_h: scale(leaf.height, zoom) as u16,
            count: leaf.points.len().min(MAX_POINTS),
            points,
        }
    }

    pub fn from_points(bbox_w: u16, bbox_h: u16, vertices: &[Point]) -> Self {
        let mut points = [Point::default(); MAX_POINTS];
        let count = vertices.len().min(MAX_POINTS);
        points[..count].copy_from_slice(&vertices[..count]);
        Self {
            bbox_w,
            bbox_h,
            count,
            points,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points[..self.count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_leaf_and_scales() {
        let bytes = [0xC5, 4, 2, 4, 0, 0, 4, 0, 4, 2, 0, 2];
        let shape = ShapeDescriptor::decode(&bytes, 0).unwrap();
        let ShapeDescriptor::Leaf(leaf) = &shape else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.color, 5);
        assert_eq!(leaf.points.len(), 4);
        let poly = Polygon::scaled(leaf, 0x80);
        assert_eq!(poly.bbox_w, 8);
        assert_eq!(poly.points()[2], Point::new(8, 4));
        assert_eq!(shape.encode(), bytes);
    }

    #[test]
    fn decodes_group_with_color_override() {
        let bytes = [
            0x02, 10, 20, 1, // anchor, two children
            0x00, 0x10, 1, 2, // child at 0x20
            0x80, 0x20, 3, 4, 0x85, 0x00, // child at 0x40, color 5
        ];
        let shape = ShapeDescriptor::decode(&bytes, 0).unwrap();
        assert_eq!(
            shape,
            ShapeDescriptor::Group(GroupShape {
                anchor_x: 10,
                anchor_y: 20,
                children: vec![
                    ChildRef {
                        offset: 0x20,
                        x: 1,
                        y: 2,
                        color: None
                    },
                    ChildRef {
                        offset: 0x40,
                        x: 3,
                        y: 4,
                        color: Some(5)
                    },
                ],
            })
        );
    }

    #[test]
    fn rejects_odd_point_counts_and_bad_types() {
        assert_eq!(
            ShapeDescriptor::decode(&[0xC0, 1, 1, 3], 0),
            Err(ShapeError::BadPointCount { count: 3 })
        );
        assert_eq!(
            ShapeDescriptor::decode(&[0x00, 0x07], 1),
            Err(ShapeError::BadType {
                kind: 0x07,
                offset: 1
            })
        );
        assert_eq!(
            ShapeDescriptor::decode(&[0xC0, 1, 1, 4, 0], 0),
            Err(ShapeError::Truncated { offset: 5 })
        );
    }
}
