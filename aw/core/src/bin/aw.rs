use anyhow::{Context, Result};
use aw_core::palette::Palette;
use aw_core::raster::{SCREEN_HEIGHT, SCREEN_WIDTH};
use aw_core::{
    Engine, EngineConfig, FrameOutcome, GamePart, Host, Language, MemoryResources, Page,
    PaletteMode, SharedAudio,
};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "aw",
    about = "Headless Another World engine runner: executes bytecode parts and dumps frames."
)]
struct Args {
    /// Directory holding `resources.json` and the resource files it lists.
    #[arg(long, value_name = "DIR")]
    data: PathBuf,

    /// JSON engine configuration; command line flags override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Host iterations to run before exiting.
    #[arg(long, default_value_t = 1_000)]
    frames: u64,

    /// Milliseconds the headless clock advances per host iteration.
    #[arg(long, default_value_t = 20)]
    step_ms: u32,

    #[arg(long, value_enum)]
    part: Option<GamePart>,

    #[arg(long, value_enum)]
    palette_mode: Option<PaletteMode>,

    #[arg(long, value_enum)]
    language: Option<Language>,

    #[arg(long)]
    seed: Option<u16>,

    /// Keep the code-wheel check instead of patching it out.
    #[arg(long)]
    enforce_protection: bool,

    /// Write every presented frame as a PPM image into this directory.
    #[arg(long, value_name = "DIR")]
    dump: Option<PathBuf>,

    /// Restore this snapshot before running.
    #[arg(long, value_name = "PATH")]
    restore: Option<PathBuf>,

    /// Save a snapshot here after the last frame.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

/// Fixed-step clock plus optional PPM frame dumps.
struct CliHost {
    now: u32,
    step: u32,
    dump: Option<PathBuf>,
    presented: u64,
}

impl Host for CliHost {
    fn ticks(&mut self) -> u32 {
        self.now
    }

    fn present(&mut self, page: &Page, palette: &Palette) {
        self.presented += 1;
        let Some(dir) = &self.dump else {
            return;
        };
        let path = dir.join(format!("frame_{:06}.ppm", self.presented));
        let mut ppm = format!("P6\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n").into_bytes();
        ppm.extend(page.to_rgb(palette));
        if let Err(err) = fs::write(&path, ppm) {
            warn!(path = %path.display(), "frame dump failed: {err}");
        }
    }

    fn sleep_until(&mut self, deadline: u32) {
        let next = self.now.wrapping_add(self.step);
        self.now = if deadline.wrapping_sub(next) as i32 > 0 {
            deadline
        } else {
            next
        };
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aw_core=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(part) = args.part {
        config.start_part = part;
    }
    if let Some(mode) = args.palette_mode {
        config.palette_mode = mode;
    }
    if let Some(language) = args.language {
        config.language = language;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }
    if args.enforce_protection {
        config.bypass_protection = false;
    }

    if let Some(dir) = &args.dump {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let resources = MemoryResources::from_dir(&args.data, config.language)
        .with_context(|| format!("reading resources from {}", args.data.display()))?;
    let host = CliHost {
        now: 0,
        step: args.step_ms.max(1),
        dump: args.dump.clone(),
        presented: 0,
    };
    let mut engine = Engine::new(config, resources, SharedAudio::new(), host);
    engine.reset().context("engine reset")?;
    if let Some(path) = &args.restore {
        engine
            .load_snapshot(path)
            .with_context(|| format!("restoring {}", path.display()))?;
    }

    let mut ticks = 0u64;
    let mut instructions = 0u64;
    for _ in 0..args.frames {
        match engine.frame().context("interpreter stopped")? {
            FrameOutcome::Quit => break,
            FrameOutcome::Skipped => {}
            FrameOutcome::Executed { instructions: n } => {
                ticks += 1;
                instructions += n as u64;
            }
        }
        let deadline = engine.next_deadline();
        engine.system_mut().host.sleep_until(deadline);
    }
    info!(
        ticks,
        instructions,
        presented = engine.system().host.presented,
        part = ?engine.part(),
        "run finished"
    );

    if let Some(path) = &args.snapshot {
        engine
            .save_snapshot(path)
            .with_context(|| format!("saving {}", path.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }
    Ok(())
}
