use crate::font;
use crate::palette::{decode_palettes, Palette, PaletteMode, Rgb, PALETTE_COLORS, PALETTE_COUNT};
use crate::polygon::{scale, Point, Polygon, ShapeDescriptor};
use crate::raster::{Canvas, Rasterizer, BYTES_PER_LINE, PAGE_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

pub const PAGE_COUNT: usize = 4;
/// Page id aliasing whichever page is on screen.
pub const PAGE_FRONT: u8 = 0xFE;
/// Page id aliasing the back buffer; blitting it swaps front and back.
pub const PAGE_BACK: u8 = 0xFF;

const BITMAP_PLANE_SIZE: usize = PAGE_SIZE / 4;
const TEXT_MAX_COLUMN: u16 = 39;
const TEXT_MAX_ROW: u16 = 192;
const MAX_SHAPE_DEPTH: usize = 32;
/// Leaves start with this color and take their own until a parent overrides it.
const INHERIT_COLOR: u8 = 0xFF;

/// One 320x200 4bpp framebuffer, two pixels per byte, left pixel in the high nibble.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    data: Box<[u8]>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE].into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|&&b| b != 0).count();
        f.debug_struct("Page").field("nonzero_bytes", &used).finish()
    }
}

impl Page {
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        let byte = self.data[y * BYTES_PER_LINE + x / 2];
        if x & 1 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    /// Expand to packed 24-bit RGB, row-major.
    pub fn to_rgb(&self, palette: &Palette) -> Vec<u8> {
        let mut out = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        for byte in self.data.iter() {
            for index in [byte >> 4, byte & 0x0F] {
                let Rgb { r, g, b } = palette[index as usize];
                out.extend([r, g, b]);
            }
        }
        out
    }
}

/// The four pages, their aliases and the palette bank.
pub struct Video {
    pages: [Page; PAGE_COUNT],
    palettes: [Palette; PALETTE_COUNT],
    palette: usize,
    /// Page the draw opcodes write to.
    draw: usize,
    /// Page currently on screen.
    front: usize,
    back: usize,
    rasterizer: Rasterizer,
}

impl Default for Video {
    fn default() -> Self {
        Self::new()
    }
}

impl Video {
    pub fn new() -> Self {
        Self {
            pages: Default::default(),
            palettes: [[Rgb::default(); PALETTE_COLORS]; PALETTE_COUNT],
            palette: 0,
            draw: 0,
            front: 1,
            back: 2,
            rasterizer: Rasterizer::new(),
        }
    }

    pub fn reset(&mut self) {
        for page in self.pages.iter_mut() {
            page.data.fill(0);
        }
        self.palettes = [[Rgb::default(); PALETTE_COLORS]; PALETTE_COUNT];
        self.palette = 0;
        self.draw = 0;
        self.front = 1;
        self.back = 2;
    }

    pub fn page(&self, index: usize) -> &Page {
        &self.pages[index]
    }

    pub fn front_page(&self) -> &Page {
        &self.pages[self.front]
    }

    pub fn draw_index(&self) -> usize {
        self.draw
    }

    pub fn front_index(&self) -> usize {
        self.front
    }

    pub fn back_index(&self) -> usize {
        self.back
    }

    pub fn palette(&self) -> &Palette {
        &self.palettes[self.palette]
    }

    pub fn palette_index(&self) -> usize {
        self.palette
    }

    fn resolve(&self, page: u8) -> usize {
        match page {
            0..=3 => page as usize,
            PAGE_FRONT => self.front,
            PAGE_BACK => self.back,
            _ => {
                error!(page = format_args!("{page:#04x}"), "unknown video page");
                self.draw
            }
        }
    }

    pub fn set_palettes(&mut self, data: &[u8], mode: PaletteMode) {
        self.palettes = decode_palettes(data, mode);
    }

    pub fn select_palette(&mut self, palette: u8) {
        if (palette as usize) < PALETTE_COUNT {
            self.palette = palette as usize;
        }
    }

    pub fn select_page(&mut self, page: u8) {
        self.draw = self.resolve(page);
    }

    pub fn fill_page(&mut self, page: u8, color: u8) {
        let index = self.resolve(page);
        self.pages[index].data.fill((color << 4) | color);
    }

    /// Copy `src` onto `dst`. Source ids with bit 7 set (after clearing bit 6)
    /// select a vertically scrolled copy of page `src & 3`.
    pub fn copy_page(&mut self, dst: u8, src: u8, vscroll: i16) {
        if src == dst {
            return;
        }
        let scrolled = src != PAGE_FRONT && src != PAGE_BACK && (src & 0xBF) & 0x80 != 0;
        if !scrolled {
            let src = if src == PAGE_FRONT || src == PAGE_BACK {
                src
            } else {
                src & 0xBF
            };
            let (from, to) = (self.resolve(src), self.resolve(dst));
            self.copy_rows(from, 0, to, 0, SCREEN_HEIGHT);
            return;
        }

        let (from, to) = (self.resolve(src & 3), self.resolve(dst));
        let limit = SCREEN_HEIGHT as i16 - 1;
        if !(-limit..=limit).contains(&vscroll) {
            debug!(vscroll, "scroll out of range, nothing copied");
            return;
        }
        let shift = vscroll.unsigned_abs() as usize;
        if vscroll < 0 {
            self.copy_rows(from, shift, to, 0, SCREEN_HEIGHT - shift);
        } else {
            self.copy_rows(from, 0, to, shift, SCREEN_HEIGHT - shift);
        }
    }

    fn copy_rows(&mut self, from: usize, src_row: usize, to: usize, dst_row: usize, rows: usize) {
        let len = rows * BYTES_PER_LINE;
        let src_start = src_row * BYTES_PER_LINE;
        let dst_start = dst_row * BYTES_PER_LINE;
        if from == to {
            self.pages[to]
                .data
                .copy_within(src_start..src_start + len, dst_start);
            return;
        }
        let (src, dst) = pages_pair(&mut self.pages, from, to);
        dst.data[dst_start..dst_start + len].copy_from_slice(&src.data[src_start..src_start + len]);
    }

    /// Update the front alias for `page` and return what should be presented.
    pub fn blit_page(&mut self, page: u8) -> (&Page, &Palette) {
        if page != PAGE_FRONT {
            if page == PAGE_BACK {
                std::mem::swap(&mut self.front, &mut self.back);
            } else {
                self.front = self.resolve(page);
            }
        }
        (&self.pages[self.front], &self.palettes[self.palette])
    }

    /// Convert a 4-plane bitmap (8000 bytes per plane) into page 0.
    pub fn draw_bitmap(&mut self, planar: &[u8]) {
        if planar.len() < BITMAP_PLANE_SIZE * 4 {
            warn!(len = planar.len(), "bitmap resource too short");
            return;
        }
        let dst = &mut self.pages[0].data;
        let mut out = 0usize;
        for src in 0..BITMAP_PLANE_SIZE {
            let mut planes = [
                planar[src],
                planar[src + BITMAP_PLANE_SIZE],
                planar[src + 2 * BITMAP_PLANE_SIZE],
                planar[src + 3 * BITMAP_PLANE_SIZE],
            ];
            for _ in 0..4 {
                let mut pixels = 0u8;
                for bit in (0..8).rev() {
                    let plane = &mut planes[bit & 3];
                    pixels = (pixels << 1) | (*plane >> 7);
                    *plane <<= 1;
                }
                dst[out] = pixels;
                out += 1;
            }
        }
    }

    /// Render `text` into the draw page. `x` counts 8-pixel columns, `y` pixels.
    pub fn draw_string(&mut self, text: &str, x: u16, y: u16, color: u8) {
        let page = &mut self.pages[self.draw].data;
        let (mut cx, mut cy) = (x, y);
        for ch in text.bytes() {
            if ch == b'\n' {
                cx = x;
                cy += 8;
                continue;
            }
            if let Some(glyph) = font::glyph(ch) {
                if cx <= TEXT_MAX_COLUMN && cy <= TEXT_MAX_ROW {
                    let origin = cy as usize * BYTES_PER_LINE + cx as usize * 4;
                    render_glyph(&mut page[origin..], glyph, color);
                }
            }
            cx += 1;
        }
    }

    /// Draw the shape at `offset` in `data`, centered on `position`.
    pub fn draw_polygons(&mut self, data: &[u8], offset: u16, position: Point, zoom: u16) {
        self.draw_shape(data, offset as usize, position, zoom, INHERIT_COLOR, 0);
    }

    fn draw_shape(
        &mut self,
        data: &[u8],
        offset: usize,
        position: Point,
        zoom: u16,
        color: u8,
        depth: usize,
    ) {
        if depth > MAX_SHAPE_DEPTH {
            warn!(offset, "polygon hierarchy too deep");
            return;
        }
        let shape = match ShapeDescriptor::decode(data, offset) {
            Ok(shape) => shape,
            Err(err) => {
                warn!("{err}");
                return;
            }
        };
        match shape {
            ShapeDescriptor::Leaf(leaf) => {
                let color = if color & 0x80 != 0 { leaf.color } else { color };
                let polygon = Polygon::scaled(&leaf, zoom);
                let draw = self.draw;
                let (dst, base) = if draw == 0 {
                    (&mut self.pages[0], None)
                } else {
                    let (base, dst) = pages_pair(&mut self.pages, 0, draw);
                    (dst, Some(&*base))
                };
                let mut canvas = Canvas::new(&mut dst.data, base.map(|p| &*p.data));
                self.rasterizer.fill(&mut canvas, &polygon, position, color);
            }
            ShapeDescriptor::Group(group) => {
                let parent = Point::new(
                    position.x.wrapping_sub(scale(group.anchor_x, zoom)),
                    position.y.wrapping_sub(scale(group.anchor_y, zoom)),
                );
                for child in group.children {
                    let at = Point::new(
                        parent.x.wrapping_add(scale(child.x, zoom)),
                        parent.y.wrapping_add(scale(child.y, zoom)),
                    );
                    let color = child.color.unwrap_or(INHERIT_COLOR);
                    self.draw_shape(data, child.offset as usize, at, zoom, color, depth + 1);
                }
            }
        }
    }

    pub fn export_snapshot(&self) -> (Value, Vec<u8>) {
        let meta = json!({
            "pages": PAGE_COUNT,
            "page_size": PAGE_SIZE,
            "draw": self.draw,
            "front": self.front,
            "back": self.back,
            "palette": self.palette,
        });
        let mut payload = Vec::with_capacity(PAGE_COUNT * PAGE_SIZE);
        for page in &self.pages {
            payload.extend_from_slice(&page.data);
        }
        (meta, payload)
    }

    pub fn load_snapshot(&mut self, metadata: &Value, payload: &[u8]) -> Result<(), String> {
        let field = |name: &str| -> Result<usize, String> {
            metadata
                .get(name)
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .ok_or_else(|| format!("video meta missing {name}"))
        };
        if field("pages")? != PAGE_COUNT || field("page_size")? != PAGE_SIZE {
            return Err("video page geometry mismatch".to_string());
        }
        if payload.len() != PAGE_COUNT * PAGE_SIZE {
            return Err(format!(
                "video payload length mismatch (expected {}, got {})",
                PAGE_COUNT * PAGE_SIZE,
                payload.len()
            ));
        }
        let (draw, front, back) = (field("draw")?, field("front")?, field("back")?);
        let palette = field("palette")?;
        if draw >= PAGE_COUNT || front >= PAGE_COUNT || back >= PAGE_COUNT {
            return Err("video page alias out of range".to_string());
        }
        if palette >= PALETTE_COUNT {
            return Err("video palette index out of range".to_string());
        }
        for (page, chunk) in self.pages.iter_mut().zip(payload.chunks_exact(PAGE_SIZE)) {
            page.data.copy_from_slice(chunk);
        }
        self.draw = draw;
        self.front = front;
        self.back = back;
        self.palette = palette;
        Ok(())
    }
}

fn render_glyph(dst: &mut [u8], glyph: &[u8; 8], color: u8) {
    for (row, &line) in glyph.iter().enumerate() {
        let mut bits_left = line;
        for col in 0..4 {
            let at = row * BYTES_PER_LINE + col;
            let mut bits = 0u8;
            let mut mask = 0xFFu8;
            if bits_left & 0x80 != 0 {
                bits |= color << 4;
                mask &= 0x0F;
            }
            bits_left <<= 1;
            if bits_left & 0x80 != 0 {
                bits |= color;
                mask &= 0xF0;
            }
            bits_left <<= 1;
            dst[at] = (dst[at] & mask) | bits;
        }
    }
}

/// Borrow two distinct pages, the first shared and the second mutable.
fn pages_pair(pages: &mut [Page; PAGE_COUNT], shared: usize, exclusive: usize) -> (&Page, &mut Page) {
    debug_assert_ne!(shared, exclusive);
    if shared < exclusive {
        let (head, tail) = pages.split_at_mut(exclusive);
        (&head[shared], &mut tail[0])
    } else {
        let (head, tail) = pages.split_at_mut(shared);
        (&tail[0], &mut head[exclusive])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_pixels(page: &Page, color: u8) -> usize {
        let mut n = 0;
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                if page.pixel(x, y) == color {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn reset_sets_default_aliases() {
        let mut video = Video::new();
        video.select_page(3);
        video.blit_page(2);
        video.reset();
        assert_eq!(
            (video.draw_index(), video.front_index(), video.back_index()),
            (0, 1, 2)
        );
    }

    #[test]
    fn blit_back_swaps_front_and_back() {
        let mut video = Video::new();
        video.blit_page(PAGE_BACK);
        assert_eq!((video.front_index(), video.back_index()), (2, 1));
        video.blit_page(PAGE_FRONT);
        assert_eq!(video.front_index(), 2);
        video.blit_page(3);
        assert_eq!((video.front_index(), video.back_index()), (3, 1));
    }

    #[test]
    fn fill_and_plain_copy() {
        let mut video = Video::new();
        video.fill_page(2, 0x5);
        assert!(video.page(2).bytes().iter().all(|&b| b == 0x55));
        video.copy_page(0, 0x42, 0);
        assert!(video.page(0).bytes().iter().all(|&b| b == 0x55));
    }

    #[test]
    fn scrolled_copy_shifts_rows() {
        let mut video = Video::new();
        video.fill_page(1, 0x3);
        video.copy_page(0, 0x81, 10);
        assert!(video.page(0).bytes()[..10 * BYTES_PER_LINE]
            .iter()
            .all(|&b| b == 0));
        assert!(video.page(0).bytes()[10 * BYTES_PER_LINE..]
            .iter()
            .all(|&b| b == 0x33));

        let mut video = Video::new();
        video.fill_page(1, 0x3);
        video.copy_page(0, 0x81, -20);
        let split = (SCREEN_HEIGHT - 20) * BYTES_PER_LINE;
        assert!(video.page(0).bytes()[..split].iter().all(|&b| b == 0x33));
        assert!(video.page(0).bytes()[split..].iter().all(|&b| b == 0));

        let mut video = Video::new();
        video.fill_page(1, 0x3);
        video.copy_page(0, 0x81, 200);
        assert!(video.page(0).bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn unknown_page_falls_back_to_draw_page() {
        let mut video = Video::new();
        video.select_page(3);
        video.fill_page(0x10, 0x1);
        assert!(video.page(3).bytes().iter().all(|&b| b == 0x11));
    }

    #[test]
    fn single_pixel_polygon() {
        let mut video = Video::new();
        video.select_page(1);
        // 1x1 leaf, color 9, four points
        let data = [0xC9, 1, 1, 4, 0, 0, 1, 0, 1, 1, 0, 1];
        video.draw_polygons(&data, 0, Point::new(101, 50), 0x40);
        assert_eq!(count_pixels(video.page(1), 9), 1);
        assert_eq!(video.page(1).pixel(101, 50), 9);
    }

    #[test]
    fn hierarchy_overrides_child_color() {
        let mut video = Video::new();
        let mut data = vec![
            0x02, 0, 0, 0, // group anchored at 0,0 with one child
            0x80, 0x06, 10, 10, 0x03, 0x00, // child at 12, offset (10, 10), color 3
        ];
        data.resize(12, 0);
        data.extend([0xC9, 1, 1, 4, 0, 0, 1, 0, 1, 1, 0, 1]);
        video.draw_polygons(&data, 0, Point::new(20, 20), 0x40);
        assert_eq!(video.page(0).pixel(30, 30), 3);
        assert_eq!(count_pixels(video.page(0), 9), 0);
    }

    #[test]
    fn text_uses_font_and_columns() {
        let mut video = Video::new();
        video.draw_string("!\n!", 1, 8, 0xF);
        // '!' has its first column bit at 0x10: pixel 3 of the glyph cell
        assert_eq!(video.page(0).pixel(8 + 3, 8), 0xF);
        assert_eq!(video.page(0).pixel(8 + 3, 16), 0xF);
        assert_eq!(video.page(0).pixel(8 + 2, 8), 0);
    }

    #[test]
    fn bitmap_planes_combine_into_nibbles() {
        let mut video = Video::new();
        let mut planar = vec![0u8; PAGE_SIZE];
        planar[0] = 0x80; // plane 0, first pixel
        planar[BITMAP_PLANE_SIZE * 3] = 0x80; // plane 3, first pixel
        video.draw_bitmap(&planar);
        assert_eq!(video.page(0).pixel(0, 0), 0x9);
        assert_eq!(video.page(0).pixel(1, 0), 0);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut video = Video::new();
        video.fill_page(3, 7);
        video.select_page(2);
        video.select_palette(4);
        let (meta, payload) = video.export_snapshot();
        let mut other = Video::new();
        other.load_snapshot(&meta, &payload).unwrap();
        assert_eq!(other.page(3), video.page(3));
        assert_eq!(other.draw_index(), 2);
        assert_eq!(other.palette_index(), 4);
    }
}
