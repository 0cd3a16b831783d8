use crate::opcode::PolygonBank;
use crate::polygon::Point;

/// Side effects the interpreter can request from the rest of the engine.
pub trait Bus {
    fn ticks(&mut self) -> u32;
    fn select_palette(&mut self, palette: u8);
    fn select_page(&mut self, page: u8);
    fn fill_page(&mut self, page: u8, color: u8);
    fn copy_page(&mut self, dst: u8, src: u8, vscroll: i16);
    fn blit_page(&mut self, page: u8);
    fn draw_string(&mut self, id: u16, x: u16, y: u16, color: u8);
    fn draw_polygons(&mut self, bank: PolygonBank, offset: u16, position: Point, zoom: u16);
    fn play_sound(&mut self, id: u16, channel: u8, volume: u8, frequency: u8);
    fn play_music(&mut self, id: u16, position: u8, delay: u16);
    fn load_resource(&mut self, id: u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    SelectPalette(u8),
    SelectPage(u8),
    FillPage { page: u8, color: u8 },
    CopyPage { dst: u8, src: u8, vscroll: i16 },
    BlitPage(u8),
    DrawString { id: u16, x: u16, y: u16, color: u8 },
    DrawPolygons {
        bank: PolygonBank,
        offset: u16,
        position: Point,
        zoom: u16,
    },
    PlaySound {
        id: u16,
        channel: u8,
        volume: u8,
        frequency: u8,
    },
    PlayMusic { id: u16, position: u8, delay: u16 },
    LoadResource(u16),
}

/// Bus that records every request and reports a caller-controlled clock.
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub now: u32,
    events: Vec<BusEvent>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BusEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn advance(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }
}

impl Bus for RecordingBus {
    fn ticks(&mut self) -> u32 {
        self.now
    }

    fn select_palette(&mut self, palette: u8) {
        self.events.push(BusEvent::SelectPalette(palette));
    }

    fn select_page(&mut self, page: u8) {
        self.events.push(BusEvent::SelectPage(page));
    }

    fn fill_page(&mut self, page: u8, color: u8) {
        self.events.push(BusEvent::FillPage { page, color });
    }

    fn copy_page(&mut self, dst: u8, src: u8, vscroll: i16) {
        self.events.push(BusEvent::CopyPage { dst, src, vscroll });
    }

    fn blit_page(&mut self, page: u8) {
        self.events.push(BusEvent::BlitPage(page));
    }

    fn draw_string(&mut self, id: u16, x: u16, y: u16, color: u8) {
        self.events.push(BusEvent::DrawString { id, x, y, color });
    }

    fn draw_polygons(&mut self, bank: PolygonBank, offset: u16, position: Point, zoom: u16) {
        self.events.push(BusEvent::DrawPolygons {
            bank,
            offset,
            position,
            zoom,
        });
    }

    fn play_sound(&mut self, id: u16, channel: u8, volume: u8, frequency: u8) {
        self.events.push(BusEvent::PlaySound {
            id,
            channel,
            volume,
            frequency,
        });
    }

    fn play_music(&mut self, id: u16, position: u8, delay: u16) {
        self.events.push(BusEvent::PlayMusic {
            id,
            position,
            delay,
        });
    }

    fn load_resource(&mut self, id: u16) {
        self.events.push(BusEvent::LoadResource(id));
    }
}
