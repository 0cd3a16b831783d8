//! Bytecode interpreter, cooperative scheduler and polygon renderer for the
//! Another World engine.
//!
//! The [`vm::VirtualMachine`] runs 64 cooperative threads over one bytecode
//! image and reaches the rest of the engine only through the [`bus::Bus`]
//! trait. [`engine::Engine`] wires it to a [`video::Video`] state, a
//! [`resources::ResourceProvider`], an [`audio::AudioSink`] and a platform
//! [`engine::Host`].

use thiserror::Error;

pub mod audio;
pub mod bus;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod font;
pub mod input;
pub mod opcode;
pub mod palette;
pub mod parts;
pub mod polygon;
pub mod raster;
pub mod registers;
pub mod resources;
pub mod snapshot;
pub mod strings;
pub mod threads;
pub mod timer;
pub mod video;
pub mod vm;

pub use audio::{AudioSink, NullAudio, SharedAudio};
pub use bus::{Bus, BusEvent, RecordingBus};
pub use config::EngineConfig;
pub use engine::{Engine, FrameOutcome, HeadlessHost, Host, System};
pub use input::{Controls, Direction};
pub use opcode::{Instruction, PolygonBank};
pub use palette::{Palette, PaletteMode, Rgb};
pub use parts::GamePart;
pub use polygon::Point;
pub use resources::{LoadOutcome, MemoryResources, ResourceKind, ResourceProvider};
pub use snapshot::{read_snapshot, write_snapshot, SnapshotLoad, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};
pub use strings::Language;
pub use video::{Page, Video};
pub use vm::{TickOutcome, VirtualMachine, VmState};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid opcode 0x{opcode:02X} at pc 0x{pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
    #[error("invalid jump condition {variant} at pc 0x{pc:04X}")]
    InvalidCondition { variant: u8, pc: u16 },
    #[error("invalid thread state {state} at pc 0x{pc:04X}")]
    InvalidResetState { state: u8, pc: u16 },
    #[error("call stack overflow at pc 0x{pc:04X}")]
    StackOverflow { pc: u16 },
    #[error("call stack underflow at pc 0x{pc:04X}")]
    StackUnderflow { pc: u16 },
    #[error("read past end of bytecode at offset 0x{offset:04X} (image is {len} bytes)")]
    ScriptOverrun { offset: usize, len: usize },
    #[error("no bytecode installed")]
    NoBytecode,
    #[error("thread {thread} exceeded its instruction budget at pc 0x{pc:04X}")]
    RunawayThread { thread: u8, pc: u16 },
    #[error("interpreter halted after a fatal error")]
    Halted,
    #[error("resource 0x{id:02X} missing")]
    MissingResource { id: u16 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("serialize error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("snapshot error: {0}")]
    InvalidSnapshot(String),
    #[error("config error: {0}")]
    Config(String),
}

impl CoreError {
    /// Errors that stop the interpreter, as opposed to I/O or data problems.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidOpcode { .. }
                | Self::InvalidCondition { .. }
                | Self::InvalidResetState { .. }
                | Self::StackOverflow { .. }
                | Self::StackUnderflow { .. }
                | Self::ScriptOverrun { .. }
                | Self::NoBytecode
                | Self::RunawayThread { .. }
                | Self::Halted
        )
    }
}
