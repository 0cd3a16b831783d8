//! Wiring between the interpreter and its collaborators.
//!
//! [`System`] answers every [`Bus`] request by routing it to the video
//! state, the resource table, the audio sink or the host. [`Engine`] owns the
//! interpreter, the controls and a `System`, and drives part changes.

use crate::audio::{
    clamp_volume, pitch_frequency, AudioSink, MusicCommand, MusicModule, MusicRequest, MusicStart,
    Sample, MUSIC_SAMPLE_PERIOD, PAULA_CARRIER,
};
use crate::bus::Bus;
use crate::config::EngineConfig;
use crate::input::Controls;
use crate::opcode::PolygonBank;
use crate::palette::{Palette, PaletteMode};
use crate::parts::GamePart;
use crate::polygon::Point;
use crate::resources::{LoadOutcome, ResourceKind, ResourceProvider, RESOURCE_SLOTS};
use crate::snapshot::{self, SnapshotLoad, SnapshotMetadata};
use crate::video::{Page, Video};
use crate::vm::{TickOutcome, VirtualMachine};
use crate::{CoreError, Result};
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Platform services: a millisecond clock, a display and input.
pub trait Host {
    fn ticks(&mut self) -> u32;
    fn present(&mut self, page: &Page, palette: &Palette);
    fn sleep_until(&mut self, _deadline: u32) {}
    /// Update `controls` from pending platform events.
    fn poll_input(&mut self, _controls: &mut Controls) {}
}

/// Host without a display whose clock advances by a fixed step on each read.
#[derive(Debug, Default, Clone)]
pub struct HeadlessHost {
    pub now: u32,
    pub step: u32,
    pub presented: u64,
    last_frame: Option<(Vec<u8>, Palette)>,
}

impl HeadlessHost {
    pub fn new(step: u32) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Raw bytes and palette of the last presented page.
    pub fn last_frame(&self) -> Option<(&[u8], &Palette)> {
        self.last_frame
            .as_ref()
            .map(|(bytes, palette)| (bytes.as_slice(), palette))
    }
}

impl Host for HeadlessHost {
    fn ticks(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.step);
        now
    }

    fn present(&mut self, page: &Page, palette: &Palette) {
        self.presented += 1;
        self.last_frame = Some((page.bytes().to_vec(), *palette));
    }

    fn sleep_until(&mut self, deadline: u32) {
        if deadline.wrapping_sub(self.now) as i32 > 0 {
            self.now = deadline;
        }
    }
}

/// Everything the interpreter talks to through the [`Bus`].
pub struct System<R, A, H> {
    pub video: Video,
    pub resources: R,
    pub audio: A,
    pub host: H,
    requested_part: Option<GamePart>,
}

impl<R: ResourceProvider, A: AudioSink, H: Host> System<R, A, H> {
    pub fn new(resources: R, audio: A, host: H) -> Self {
        Self {
            video: Video::new(),
            resources,
            audio,
            host,
            requested_part: None,
        }
    }

    pub fn requested_part(&self) -> Option<GamePart> {
        self.requested_part
    }

    fn loaded_data(&self, id: u16, kind: ResourceKind) -> Option<Arc<[u8]>> {
        if id >= RESOURCE_SLOTS as u16 {
            warn!(id, ?kind, "resource id out of range");
            return None;
        }
        let Some(resource) = self.resources.resource(id as u8) else {
            warn!(id, ?kind, "resource not found");
            return None;
        };
        if resource.kind != kind {
            warn!(id, expected = ?kind, found = ?resource.kind, "resource has wrong type");
            return None;
        }
        let data = resource.data();
        if data.is_none() {
            warn!(id, ?kind, "resource not loaded");
        }
        data.cloned()
    }

    fn music_start(&self, id: u16, position: u8, delay: u16) -> Option<MusicStart> {
        let data = self.loaded_data(id, ResourceKind::Music)?;
        let Some(module) = MusicModule::parse(id, data) else {
            warn!(id, "music module header truncated");
            return None;
        };
        let frequency = (PAULA_CARRIER / MUSIC_SAMPLE_PERIOD) as u16;
        let instruments = module
            .instruments
            .iter()
            .map(|&(sample_id, volume)| {
                if sample_id == 0 {
                    return None;
                }
                let data = self.loaded_data(sample_id, ResourceKind::Sound)?;
                Sample::parse(sample_id, data, frequency, clamp_volume(volume))
            })
            .collect();
        Some(MusicStart {
            module,
            position,
            delay,
            instruments,
        })
    }
}

impl<R: ResourceProvider, A: AudioSink, H: Host> Bus for System<R, A, H> {
    fn ticks(&mut self) -> u32 {
        self.host.ticks()
    }

    fn select_palette(&mut self, palette: u8) {
        self.video.select_palette(palette);
    }

    fn select_page(&mut self, page: u8) {
        self.video.select_page(page);
    }

    fn fill_page(&mut self, page: u8, color: u8) {
        self.video.fill_page(page, color);
    }

    fn copy_page(&mut self, dst: u8, src: u8, vscroll: i16) {
        self.video.copy_page(dst, src, vscroll);
    }

    fn blit_page(&mut self, page: u8) {
        let (front, palette) = self.video.blit_page(page);
        self.host.present(front, palette);
    }

    fn draw_string(&mut self, id: u16, x: u16, y: u16, color: u8) {
        match self.resources.string(id) {
            Some(text) => self.video.draw_string(text, x, y, color),
            None => warn!(id, "string not found"),
        }
    }

    fn draw_polygons(&mut self, bank: PolygonBank, offset: u16, position: Point, zoom: u16) {
        match self.resources.polygon_data(bank) {
            Some(data) => self.video.draw_polygons(data, offset, position, zoom),
            None => warn!(?bank, offset, "polygon bank not loaded"),
        }
    }

    fn play_sound(&mut self, id: u16, channel: u8, volume: u8, frequency: u8) {
        let Some(data) = self.loaded_data(id, ResourceKind::Sound) else {
            return;
        };
        let rate = pitch_frequency(frequency);
        match Sample::parse(id, data, rate, clamp_volume(volume as u16)) {
            Some(sample) => self.audio.play_sound(channel, sample),
            None => warn!(id, "sound header truncated"),
        }
    }

    fn play_music(&mut self, id: u16, position: u8, delay: u16) {
        let request = match MusicCommand::classify(id, position, delay) {
            MusicCommand::Start {
                id,
                position,
                delay,
            } => match self.music_start(id, position, delay) {
                Some(start) => MusicRequest::Start(start),
                None => MusicRequest::Stop,
            },
            MusicCommand::Update { position, delay } => MusicRequest::Update { position, delay },
            MusicCommand::Stop => MusicRequest::Stop,
        };
        self.audio.play_music(request);
    }

    fn load_resource(&mut self, id: u16) {
        match self.resources.load_resource(id) {
            LoadOutcome::PartRequested(part) => {
                debug!(?part, "part switch requested");
                self.requested_part = Some(part);
            }
            LoadOutcome::Loaded(ResourceKind::Bitmap)
            | LoadOutcome::AlreadyLoaded(ResourceKind::Bitmap) => {
                if let Some(data) = self.loaded_data(id, ResourceKind::Bitmap) {
                    self.video.draw_bitmap(&data);
                }
            }
            _ => {}
        }
    }
}

/// Result of one [`Engine::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Quit,
    Skipped,
    Executed { instructions: u32 },
}

/// The interpreter plus everything it drives.
pub struct Engine<R, A, H> {
    config: EngineConfig,
    vm: VirtualMachine,
    controls: Controls,
    system: System<R, A, H>,
    part: GamePart,
    palette_mode: PaletteMode,
    palettes: Arc<[u8]>,
}

impl<R: ResourceProvider, A: AudioSink, H: Host> Engine<R, A, H> {
    pub fn new(config: EngineConfig, resources: R, audio: A, host: H) -> Self {
        let mut vm = VirtualMachine::new();
        vm.set_frame_slice(config.frame_slice_ms);
        vm.set_instruction_budget(config.instruction_budget);
        Self {
            part: config.start_part,
            palette_mode: config.palette_mode,
            config,
            vm,
            controls: Controls::new(),
            system: System::new(resources, audio, host),
            palettes: Arc::from(Vec::new()),
        }
    }

    /// Power-on reset followed by loading the configured start part.
    pub fn reset(&mut self) -> Result<()> {
        let seed = self.config.random_seed.unwrap_or_else(wall_clock_seed);
        info!(seed, part = ?self.config.start_part, "engine reset");
        self.vm.reset(seed, self.config.reset_profile());
        self.init_part(self.config.start_part)
    }

    /// Switch to `part`: clear video, audio and input, load its segments and
    /// restart the interpreter on the new bytecode.
    pub fn init_part(&mut self, part: GamePart) -> Result<()> {
        self.system.video.reset();
        self.system.audio.stop_all();
        self.reset_controls();
        self.system.requested_part = None;
        let data = self.system.resources.load_part(part)?;
        self.system
            .video
            .set_palettes(&data.palettes, self.palette_mode);
        self.palettes = data.palettes;
        self.vm.set_bytecode(data.bytecode);
        self.vm
            .set_protection_bypass(self.config.bypass_protection && part == GamePart::Protection);
        self.part = part;
        Ok(())
    }

    /// One host iteration: poll input, run a tick if due, then honour any
    /// part switch the scripts asked for.
    pub fn frame(&mut self) -> Result<FrameOutcome> {
        self.system.host.poll_input(&mut self.controls);
        if self.controls.quit {
            return Ok(FrameOutcome::Quit);
        }
        let outcome = self.vm.run(&mut self.controls, &mut self.system)?;
        if let Some(part) = self.system.requested_part.take() {
            info!(from = ?self.part, to = ?part, "switching part");
            self.init_part(part)?;
        }
        Ok(match outcome {
            TickOutcome::Skipped => FrameOutcome::Skipped,
            TickOutcome::Executed { instructions } => FrameOutcome::Executed { instructions },
        })
    }

    /// Loop on [`Engine::frame`] until the controls ask to quit.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.frame()? == FrameOutcome::Quit {
                return Ok(());
            }
            let deadline = self.vm.clock().next_deadline();
            self.system.host.sleep_until(deadline);
        }
    }

    /// Cycle to the next palette decode mode and re-decode the current part's palettes.
    pub fn switch_palettes(&mut self) -> PaletteMode {
        self.palette_mode = self.palette_mode.next();
        self.system
            .video
            .set_palettes(&self.palettes, self.palette_mode);
        debug!(mode = ?self.palette_mode, "palette mode switched");
        self.palette_mode
    }

    fn reset_controls(&mut self) {
        let quit = self.controls.quit;
        self.controls = Controls::new();
        self.controls.quit = quit;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn vm(&self) -> &VirtualMachine {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut VirtualMachine {
        &mut self.vm
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub fn system(&self) -> &System<R, A, H> {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut System<R, A, H> {
        &mut self.system
    }

    pub fn part(&self) -> GamePart {
        self.part
    }

    pub fn palette_mode(&self) -> PaletteMode {
        self.palette_mode
    }

    pub fn next_deadline(&self) -> u32 {
        self.vm.clock().next_deadline()
    }

    pub fn write_snapshot<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let loaded = (0..RESOURCE_SLOTS)
            .filter_map(|id| self.system.resources.resource(id as u8))
            .filter(|r| r.is_loaded())
            .map(|r| r.id)
            .collect();
        let (video_meta, pages) = self.system.video.export_snapshot();
        let metadata = SnapshotMetadata {
            part: self.part,
            palette_mode: self.palette_mode,
            loaded_resources: loaded,
            vm: self.vm.capture_state(),
            video: video_meta,
            ..SnapshotMetadata::default()
        };
        snapshot::write_snapshot(writer, &metadata, &pages)
    }

    /// Restore a snapshot taken with [`Engine::write_snapshot`]. The part it
    /// names is reloaded from the resource provider first.
    pub fn read_snapshot<Rd: Read + Seek>(&mut self, reader: Rd) -> Result<()> {
        let SnapshotLoad { metadata, pages } = snapshot::read_snapshot(reader)?;
        self.palette_mode = metadata.palette_mode;
        self.init_part(metadata.part)?;
        for id in &metadata.loaded_resources {
            self.system.resources.load_resource(*id as u16);
        }
        self.vm.restore_state(&metadata.vm)?;
        self.system
            .video
            .load_snapshot(&metadata.video, &pages)
            .map_err(CoreError::InvalidSnapshot)?;
        info!(part = ?self.part, tick = self.vm.tick_count(), "snapshot restored");
        Ok(())
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_snapshot(file)
    }

    pub fn load_snapshot(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path)?;
        self.read_snapshot(file)
    }
}

fn wall_clock_seed() -> u16 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u16 ^ d.as_secs() as u16)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NullAudio, SharedAudio};
    use crate::resources::MemoryResources;

    fn resources_with(code: &[u8]) -> MemoryResources {
        let mut res = MemoryResources::default();
        res.insert(0x17, ResourceKind::Palette, vec![0u8; 2048]);
        res.insert(0x18, ResourceKind::Bytecode, code.to_vec());
        res.insert(0x19, ResourceKind::Polygon1, vec![0u8; 16]);
        res
    }

    fn config() -> EngineConfig {
        EngineConfig {
            random_seed: Some(0x1234),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn reset_loads_start_part() {
        // yield
        let res = resources_with(&[0x06]);
        let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        assert_eq!(engine.part(), GamePart::Introduction);
        assert_eq!(engine.vm().register(0x3C), 0x1234);
        assert!(matches!(
            engine.frame().unwrap(),
            FrameOutcome::Executed { .. }
        ));
    }

    #[test]
    fn quit_stops_before_running() {
        let res = resources_with(&[0x06]);
        let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        engine.controls_mut().quit = true;
        assert_eq!(engine.frame().unwrap(), FrameOutcome::Quit);
        assert_eq!(engine.vm().tick_count(), 0);
    }

    #[test]
    fn sound_requires_loaded_sound_resource() {
        let mut res = resources_with(&[0x06]);
        res.insert(0x40, ResourceKind::Sound, vec![0, 2, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4]);
        res.insert(0x41, ResourceKind::Bitmap, vec![0u8; 32000]);
        let audio = SharedAudio::new();
        let mut system = System::new(res, audio.clone(), HeadlessHost::new(1));

        system.play_sound(0x40, 1, 0x7F, 3);
        assert!(audio.snapshot().channels[1].is_none(), "not loaded yet");

        system.load_resource(0x40);
        system.play_sound(0x41, 1, 0x10, 3);
        assert!(audio.snapshot().channels[1].is_none(), "wrong type");

        system.play_sound(0x40, 5, 0x7F, 3);
        let sample = audio.snapshot().channels[1].clone().unwrap();
        assert_eq!(sample.volume, 0x3F);
        assert_eq!(sample.frequency, pitch_frequency(3));
        assert_eq!(sample.data_len, 4);
    }

    #[test]
    fn failed_music_start_stops_playback() {
        let mut res = resources_with(&[0x06]);
        let mut module = vec![0u8; 0xC0];
        module[0..2].copy_from_slice(&0x0030u16.to_be_bytes());
        res.insert(0x30, ResourceKind::Music, module);
        let audio = SharedAudio::new();
        let mut system = System::new(res, audio.clone(), HeadlessHost::new(1));
        system.load_resource(0x30);

        system.play_music(0x30, 2, 0);
        let music = audio.snapshot().music.unwrap();
        assert_eq!((music.position, music.ticks), (2, 0x30));
        assert!(music.instruments.iter().all(Option::is_none));

        system.play_music(0x31, 0, 0);
        assert!(audio.snapshot().music.is_none());
    }

    #[test]
    fn loadres_part_id_is_applied_after_tick() {
        // loadres 0x3E82 ; yield
        let mut res = resources_with(&[0x19, 0x3E, 0x82, 0x06]);
        res.insert(0x1A, ResourceKind::Palette, vec![0u8; 2048]);
        res.insert(0x1B, ResourceKind::Bytecode, vec![0x06]);
        res.insert(0x1C, ResourceKind::Polygon1, vec![0u8; 4]);
        res.insert(0x11, ResourceKind::Polygon2, vec![0u8; 4]);
        let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        engine.frame().unwrap();
        assert_eq!(engine.part(), GamePart::Water);
        assert!(engine.system().requested_part().is_none());
        assert!(engine
            .system()
            .resources
            .polygon_data(PolygonBank::Secondary)
            .is_some());
    }

    #[test]
    fn code_wheel_bypass_follows_part_and_config() {
        let protection = || {
            let mut res = MemoryResources::default();
            res.insert(0x14, ResourceKind::Palette, vec![0u8; 2048]);
            res.insert(0x15, ResourceKind::Bytecode, vec![0x06]);
            res.insert(0x16, ResourceKind::Polygon1, vec![0u8; 16]);
            res
        };
        let start = EngineConfig {
            start_part: GamePart::Protection,
            ..config()
        };
        let mut engine = Engine::new(start.clone(), protection(), NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        assert!(engine.vm().protection_bypass());

        let strict = EngineConfig {
            bypass_protection: false,
            ..start
        };
        let mut engine = Engine::new(strict, protection(), NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        assert!(!engine.vm().protection_bypass());

        let mut engine = Engine::new(config(), resources_with(&[0x06]), NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        assert!(!engine.vm().protection_bypass(), "only the protection part is patched");
    }

    #[test]
    fn switch_palettes_cycles_modes() {
        let res = resources_with(&[0x06]);
        let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
        engine.reset().unwrap();
        assert_eq!(engine.switch_palettes(), PaletteMode::RgbAlt);
        for _ in 0..4 {
            engine.switch_palettes();
        }
        assert_eq!(engine.palette_mode(), PaletteMode::Rgb);
    }
}
