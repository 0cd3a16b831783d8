use crate::polygon::{Point, Polygon};
use tracing::warn;

pub const SCREEN_WIDTH: usize = 320;
pub const SCREEN_HEIGHT: usize = 200;
pub const BYTES_PER_LINE: usize = SCREEN_WIDTH / 2;
pub const PAGE_SIZE: usize = BYTES_PER_LINE * SCREEN_HEIGHT;

const XMIN: i16 = 0;
const XMAX: i16 = SCREEN_WIDTH as i16 - 1;
const YMIN: i16 = 0;
const YMAX: i16 = SCREEN_HEIGHT as i16 - 1;
const INTERPOLATE_LEN: usize = 0x400;

/// How a span is painted, chosen from the polygon color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanMode {
    Plain(u8),
    /// Set the high bit of every covered pixel.
    Blend,
    /// Copy covered pixels from the base page (page 0).
    CopyFromBase,
}

impl SpanMode {
    pub fn for_color(color: u8) -> Self {
        match color {
            0x10 => Self::Blend,
            c if c < 0x10 => Self::Plain(c),
            _ => Self::CopyFromBase,
        }
    }
}

/// Destination page plus the base page read by [`SpanMode::CopyFromBase`].
///
/// `base` is `None` when the destination is the base page itself, in which
/// case copy spans leave the page unchanged.
pub struct Canvas<'a> {
    pub dst: &'a mut [u8],
    pub base: Option<&'a [u8]>,
}

impl<'a> Canvas<'a> {
    pub fn new(dst: &'a mut [u8], base: Option<&'a [u8]>) -> Self {
        Self { dst, base }
    }

    /// Paint pixels `x1..=x2` of line `y`. Coordinates must already be on screen.
    pub fn span(&mut self, x1: i16, x2: i16, y: i16, mode: SpanMode) {
        let (x1, x2) = (x1 as usize, x2 as usize);
        let mut at = y as usize * BYTES_PER_LINE + x1 / 2;
        let mut width = x2 / 2 - x1 / 2 + 1;
        let lead = x1 & 1 != 0;
        let tail = x2 & 1 == 0;
        if lead {
            width -= 1;
        }
        if tail {
            width -= 1;
        }
        let dst = &mut *self.dst;
        match mode {
            SpanMode::Plain(color) => {
                let color = (color & 0x0F) * 0x11;
                if lead {
                    dst[at] = (dst[at] & 0xF0) | (color & 0x0F);
                    at += 1;
                }
                dst[at..at + width].fill(color);
                at += width;
                if tail {
                    dst[at] = (dst[at] & 0x0F) | (color & 0xF0);
                }
            }
            SpanMode::Blend => {
                if lead {
                    dst[at] = (dst[at] & 0xF7) | 0x08;
                    at += 1;
                }
                for byte in &mut dst[at..at + width] {
                    *byte |= 0x88;
                }
                at += width;
                if tail {
                    dst[at] = (dst[at] & 0x7F) | 0x80;
                }
            }
            SpanMode::CopyFromBase => {
                let Some(src) = self.base else {
                    return;
                };
                if lead {
                    dst[at] = (dst[at] & 0xF0) | (src[at] & 0x0F);
                    at += 1;
                }
                dst[at..at + width].copy_from_slice(&src[at..at + width]);
                at += width;
                if tail {
                    dst[at] = (dst[at] & 0x0F) | (src[at] & 0xF0);
                }
            }
        }
    }

    fn point(&mut self, x: i16, y: i16, mode: SpanMode) {
        if !(XMIN..=XMAX).contains(&x) || !(YMIN..=YMAX).contains(&y) {
            return;
        }
        self.span(x, x, y, mode);
    }

    fn line(&mut self, x1: i16, x2: i16, y: i16, mode: SpanMode) {
        let (x1, x2) = if x1 > x2 { (x2, x1) } else { (x1, x2) };
        if x1 > XMAX || x2 < XMIN || y > YMAX || y < YMIN {
            return;
        }
        self.span(x1.max(XMIN), x2.min(XMAX), y, mode);
    }
}

/// Scanline polygon filler.
pub struct Rasterizer {
    interpolate: [u16; INTERPOLATE_LEN],
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        let mut interpolate = [0u16; INTERPOLATE_LEN];
        interpolate[0] = 0x4000;
        for (i, slot) in interpolate.iter_mut().enumerate().skip(1) {
            *slot = (0x4000 / i) as u16;
        }
        Self { interpolate }
    }

    /// Horizontal step per scanline from `a` to `b`, as Q16. Returns `(step, dy)`.
    fn step(&self, a: Point, b: Point) -> Option<(i32, i32)> {
        let dx = b.x as i32 - a.x as i32;
        let dy = b.y as i32 - a.y as i32;
        let reciprocal = *self.interpolate.get(usize::try_from(dy).ok()?)? as i32;
        Some((dx.wrapping_mul(reciprocal).wrapping_mul(4), dy))
    }

    /// Fill `poly` with its bounding box centered on `position`.
    pub fn fill(&self, canvas: &mut Canvas<'_>, poly: &Polygon, position: Point, color: u8) {
        let mode = SpanMode::for_color(color);
        let half_w = (poly.bbox_w / 2) as i32;
        let half_h = (poly.bbox_h / 2) as i32;
        let x1 = (position.x as i32 - half_w) as i16;
        let x2 = (position.x as i32 + half_w) as i16;
        let y1 = (position.y as i32 - half_h) as i16;
        let y2 = (position.y as i32 + half_h) as i16;
        if x1 > XMAX || x2 < XMIN || y1 > YMAX || y2 < YMIN {
            return;
        }

        let points = poly.points();
        if points.len() == 4
            && ((poly.bbox_w == 1 && poly.bbox_h <= 1) || (poly.bbox_h == 1 && poly.bbox_w <= 1))
        {
            canvas.point(position.x, position.y, mode);
            return;
        }
        if points.len() < 2 {
            return;
        }
        if points.len() & 1 != 0 {
            warn!(count = points.len(), "polygon with an odd vertex count");
            return;
        }

        // Walk inward from both ends of the vertex list: `left` climbs from
        // the first vertex, `right` descends from the last one.
        let mut left = 0usize;
        let mut right = points.len() - 1;
        let mut xa = (x1 as i32 + points[left].x as i32) << 16;
        let mut xb = (x1 as i32 + points[right].x as i32) << 16;
        let mut yl = y1 as i32;
        let mut remaining = points.len();

        while remaining != 0 {
            let (Some((step1, _)), Some((step2, dy))) = (
                self.step(points[left], points[left + 1]),
                self.step(points[right], points[right - 1]),
            ) else {
                warn!(
                    left = left,
                    right = right,
                    "polygon edge out of interpolation range"
                );
                return;
            };
            xa = (xa & !0xFFFF) | 0x8000;
            xb = (xb & !0xFFFF) | 0x7FFF;
            if dy != 0 {
                for _ in 0..dy {
                    canvas.line((xa >> 16) as i16, (xb >> 16) as i16, yl as i16, mode);
                    xa = xa.wrapping_add(step1);
                    xb = xb.wrapping_add(step2);
                    yl += 1;
                }
            } else {
                xa = xa.wrapping_add(step1);
                xb = xb.wrapping_add(step2);
            }
            left += 1;
            right -= 1;
            remaining -= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Vec<u8> {
        vec![0u8; PAGE_SIZE]
    }

    #[test]
    fn plain_span_masks_partial_bytes() {
        let mut dst = vec![0xAA; PAGE_SIZE];
        let mut canvas = Canvas::new(&mut dst, None);
        canvas.span(1, 4, 0, SpanMode::Plain(0x3));
        assert_eq!(&dst[0..4], &[0xA3, 0x33, 0x3A, 0xAA]);
    }

    #[test]
    fn blend_sets_high_bit_per_pixel() {
        let mut dst = page();
        let mut canvas = Canvas::new(&mut dst, None);
        canvas.span(1, 4, 2, SpanMode::Blend);
        let row = 2 * BYTES_PER_LINE;
        assert_eq!(&dst[row..row + 4], &[0x08, 0x88, 0x80, 0x00]);
    }

    #[test]
    fn copy_span_reads_base_page() {
        let base = vec![0x5C; PAGE_SIZE];
        let mut dst = page();
        let mut canvas = Canvas::new(&mut dst, Some(&base));
        canvas.span(3, 6, 0, SpanMode::CopyFromBase);
        assert_eq!(&dst[0..4], &[0x00, 0x0C, 0x5C, 0x50]);
    }

    #[test]
    fn reciprocal_table_matches_q14() {
        let r = Rasterizer::new();
        assert_eq!(r.interpolate[0], 0x4000);
        assert_eq!(r.interpolate[1], 0x4000);
        assert_eq!(r.interpolate[3], 0x1555);
        assert_eq!(r.interpolate[0x3FF], 0x10);
    }

    #[test]
    fn fills_axis_aligned_rectangle() {
        let r = Rasterizer::new();
        let mut dst = page();
        let mut canvas = Canvas::new(&mut dst, None);
        let rect = Polygon::from_points(
            8,
            4,
            &[
                Point::new(8, 0),
                Point::new(8, 4),
                Point::new(0, 4),
                Point::new(0, 0),
            ],
        );
        r.fill(&mut canvas, &rect, Point::new(20, 20), 0x7);
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                let byte = dst[y * BYTES_PER_LINE + x / 2];
                let pixel = if x & 1 == 0 { byte >> 4 } else { byte & 0x0F };
                let inside = (16..=24).contains(&x) && (18..22).contains(&y);
                assert_eq!(pixel, if inside { 7 } else { 0 }, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn invalid_edge_aborts_quietly() {
        let r = Rasterizer::new();
        let mut dst = page();
        let mut canvas = Canvas::new(&mut dst, None);
        // Right-hand edge climbs upward, which the walk cannot represent.
        let poly = Polygon::from_points(
            4,
            4,
            &[Point::new(0, 0), Point::new(4, 4), Point::new(4, 4), Point::new(0, 8)],
        );
        r.fill(&mut canvas, &poly, Point::new(50, 50), 1);
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn edge_taller_than_reciprocal_table_is_skipped() {
        let r = Rasterizer::new();
        let mut dst = page();
        let mut canvas = Canvas::new(&mut dst, None);
        let poly = Polygon::from_points(
            2,
            1100,
            &[Point::new(0, 0), Point::new(0, 1100), Point::new(2, 1100), Point::new(2, 0)],
        );
        r.fill(&mut canvas, &poly, Point::new(10, 100), 1);
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn odd_vertex_count_draws_nothing() {
        let r = Rasterizer::new();
        let mut dst = page();
        let mut canvas = Canvas::new(&mut dst, None);
        let poly = Polygon::from_points(
            8,
            8,
            &[Point::new(8, 0), Point::new(8, 8), Point::new(0, 8)],
        );
        r.fill(&mut canvas, &poly, Point::new(40, 40), 3);
        assert!(dst.iter().all(|&b| b == 0));
    }
}
