use aw_core::audio::SharedAudio;
use aw_core::engine::{Engine, FrameOutcome, HeadlessHost};
use aw_core::palette::{Rgb, PALETTE_SET_SIZE};
use aw_core::raster::{BYTES_PER_LINE, PAGE_SIZE};
use aw_core::resources::{MemoryResources, ResourceKind, ResourceProvider};
use aw_core::{CoreError, EngineConfig, GamePart, NullAudio, PolygonBank};
use std::io::Cursor;

const INTRO_PALETTES: u8 = 0x17;
const INTRO_BYTECODE: u8 = 0x18;
const INTRO_POLYGONS: u8 = 0x19;

fn palettes() -> Vec<u8> {
    let mut data = vec![0u8; PALETTE_SET_SIZE * 2];
    data[2 * 2..2 * 2 + 2].copy_from_slice(&0x000Fu16.to_be_bytes());
    data[9 * 2..9 * 2 + 2].copy_from_slice(&0x0F00u16.to_be_bytes());
    data
}

fn intro(code: &[u8]) -> MemoryResources {
    let mut res = MemoryResources::default();
    res.insert(INTRO_PALETTES, ResourceKind::Palette, palettes());
    res.insert(INTRO_BYTECODE, ResourceKind::Bytecode, code.to_vec());
    // single 1x1 leaf of color 9 at offset 0
    res.insert(
        INTRO_POLYGONS,
        ResourceKind::Polygon1,
        vec![0xC9, 1, 1, 4, 0, 0, 1, 0, 1, 1, 0, 1],
    );
    res
}

fn config() -> EngineConfig {
    EngineConfig {
        random_seed: Some(0x2A),
        ..EngineConfig::default()
    }
}

fn engine(code: &[u8]) -> Engine<MemoryResources, SharedAudio, HeadlessHost> {
    let mut engine = Engine::new(config(), intro(code), SharedAudio::new(), HeadlessHost::new(1));
    engine.reset().expect("reset");
    engine
}

fn run_ticks<R: ResourceProvider, A: aw_core::AudioSink, H: aw_core::Host>(
    engine: &mut Engine<R, A, H>,
    ticks: u64,
) {
    let target = engine.vm().tick_count() + ticks;
    let mut guard = 0;
    while engine.vm().tick_count() < target {
        engine.frame().expect("frame");
        guard += 1;
        assert!(guard < 1000, "engine never became ready");
    }
}

#[test]
fn script_draws_and_presents_a_frame() {
    let code = [
        0x0D, 0x01, //             page 1
        0x0E, 0x01, 0x02, //       fill 1, color 2
        0x80, 0x00, 100, 50, //    draw polygon 0 at (100, 50)
        0x10, 0x01, //             blit 1
        0x06, //                   0B: yield
        0x07, 0x00, 0x0B, //       jmp 0x0B
    ];
    let mut engine = engine(&code);
    run_ticks(&mut engine, 1);

    let host = &engine.system().host;
    assert_eq!(host.presented, 1);
    let (bytes, palette) = host.last_frame().expect("a presented frame");
    assert_eq!(bytes[50 * BYTES_PER_LINE + 50], 0x92);
    assert_eq!(bytes[0], 0x22);
    assert_eq!(palette[9], Rgb::new(0xFF, 0, 0));
    assert_eq!(palette[2], Rgb::new(0, 0, 0xFF));
}

#[test]
fn loading_a_bitmap_draws_page_zero() {
    let code = [
        0x19, 0x00, 0x12, // loadres 0x12
        0x06, //             yield
        0x07, 0x00, 0x03, // jmp 0x03
    ];
    let mut res = intro(&code);
    let mut planar = vec![0u8; PAGE_SIZE];
    planar[0] = 0x80;
    res.insert(0x12, ResourceKind::Bitmap, planar);
    let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
    engine.reset().unwrap();
    run_ticks(&mut engine, 1);
    assert_eq!(engine.system().video.page(0).pixel(0, 0), 1);
    assert!(engine.system().resources.resource(0x12).unwrap().is_loaded());
}

#[test]
fn print_uses_the_string_table() {
    let code = [
        0x12, 0x00, 0x01, 0x01, 0x08, 0x0F, // print 0x0001 at column 1, row 8
        0x12, 0x7F, 0xFF, 0x01, 0x40, 0x0F, // print unknown id
        0x06,
    ];
    let mut engine = engine(&code);
    run_ticks(&mut engine, 1);
    let page = engine.system().video.page(0).bytes();
    let text_rows = &page[8 * BYTES_PER_LINE..16 * BYTES_PER_LINE];
    assert!(text_rows.iter().any(|&b| b != 0));
    assert!(page[0x40 * BYTES_PER_LINE..].iter().all(|&b| b == 0));
}

#[test]
fn sound_opcode_reaches_the_channel_bank() {
    let code = [
        0x19, 0x00, 0x40, //             loadres 0x40
        0x18, 0x00, 0x40, 10, 0x20, 2, // sound 0x40, pitch 10, volume 0x20, channel 2
        0x06,
    ];
    let mut res = intro(&code);
    res.insert(0x40, ResourceKind::Sound, vec![0, 2, 0, 1, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6]);
    let audio = SharedAudio::new();
    let mut engine = Engine::new(config(), res, audio.clone(), HeadlessHost::new(1));
    engine.reset().unwrap();
    run_ticks(&mut engine, 1);

    let sample = audio.snapshot().channels[2].clone().expect("sample on channel 2");
    assert_eq!(sample.volume, 0x20);
    assert_eq!(sample.frequency, aw_core::audio::pitch_frequency(10));
    assert_eq!((sample.loop_pos, sample.loop_len, sample.data_len), (4, 2, 6));
}

#[test]
fn part_switch_reloads_segments_and_keeps_registers() {
    let code = [
        0x00, 0x50, 0x12, 0x34, // movi $50, #0x1234
        0x19, 0x3E, 0x82, //       loadres water
        0x06,
    ];
    let mut res = intro(&code);
    res.insert(0x1A, ResourceKind::Palette, palettes());
    res.insert(0x1B, ResourceKind::Bytecode, vec![0x06]);
    res.insert(0x1C, ResourceKind::Polygon1, vec![0u8; 4]);
    res.insert(0x11, ResourceKind::Polygon2, vec![0u8; 4]);
    let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
    engine.reset().unwrap();
    run_ticks(&mut engine, 1);

    assert_eq!(engine.part(), GamePart::Water);
    assert_eq!(engine.vm().register(0x50), 0x1234);
    assert_eq!(engine.vm().threads().get(0).current_pc, 0);
    let resources = &engine.system().resources;
    assert!(!resources.resource(INTRO_BYTECODE).unwrap().is_loaded());
    assert!(resources.resource(0x1B).unwrap().is_loaded());
    assert!(resources.polygon_data(PolygonBank::Secondary).is_some());
}

#[test]
fn fatal_script_error_halts_the_engine() {
    let mut engine = engine(&[0x1B]);
    let err = engine.frame().unwrap_err();
    assert!(matches!(err, CoreError::InvalidOpcode { opcode: 0x1B, pc: 0 }), "got {err}");
    assert!(engine.vm().is_halted());
    assert!(matches!(engine.frame(), Err(CoreError::Halted)));
}

#[test]
fn missing_part_segment_fails_reset() {
    let mut res = MemoryResources::default();
    res.insert(INTRO_PALETTES, ResourceKind::Palette, palettes());
    let mut engine = Engine::new(config(), res, NullAudio, HeadlessHost::new(1));
    let err = engine.reset().unwrap_err();
    assert!(matches!(err, CoreError::MissingResource { id: 0x18 }), "got {err}");
}

#[test]
fn snapshot_restores_interpreter_and_pages() {
    let code = [
        0x03, 0x10, 0x00, 0x01, // 00: addi $10, #1
        0x0E, 0x02, 0x05, //       04: fill 2, color 5
        0x06, //                   07: yield
        0x07, 0x00, 0x00, //       08: jmp 0x00
    ];
    let mut first = engine(&code);
    run_ticks(&mut first, 3);
    assert_eq!(first.vm().register(0x10), 3);

    let mut archive = Cursor::new(Vec::new());
    first.write_snapshot(&mut archive).unwrap();

    let mut second = engine(&code);
    second.read_snapshot(Cursor::new(archive.into_inner())).unwrap();
    assert_eq!(second.part(), first.part());
    assert_eq!(second.vm().register(0x10), 3);
    assert_eq!(second.vm().tick_count(), first.vm().tick_count());
    assert_eq!(
        second.vm().threads().get(0).current_pc,
        first.vm().threads().get(0).current_pc
    );
    assert_eq!(second.system().video.page(2), first.system().video.page(2));

    run_ticks(&mut first, 1);
    run_ticks(&mut second, 1);
    assert_eq!(second.vm().register(0x10), 4);
    assert_eq!(
        second.vm().registers().as_slice(),
        first.vm().registers().as_slice()
    );
}

#[test]
fn quit_returns_without_ticking() {
    let mut engine = engine(&[0x06]);
    engine.controls_mut().quit = true;
    assert_eq!(engine.frame().unwrap(), FrameOutcome::Quit);
    engine.run().unwrap();
    assert_eq!(engine.vm().tick_count(), 0);
}
