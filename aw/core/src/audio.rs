//! Sound and music requests handed to the mixer.
//!
//! Only the request surface lives here: decoding sample headers, mapping
//! pitches through the Paula period table and keeping the channel bank that a
//! host mixer callback reads. Mixing and sequencing belong to the host.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

pub const CHANNEL_COUNT: usize = 4;
pub const MAX_VOLUME: u8 = 0x3F;
pub const PAULA_FREQUENCY: u32 = 7_159_090;
pub const PAULA_CARRIER: u32 = PAULA_FREQUENCY / 2;
/// Period used for every instrument of a music module.
pub const MUSIC_SAMPLE_PERIOD: u32 = 109;
pub const MUSIC_INSTRUMENTS: usize = 15;
pub const MUSIC_ORDER_LEN: usize = 128;
const SAMPLE_HEADER_LEN: usize = 8;
const MUSIC_HEADER_LEN: usize = 0xC0;

const PERIODS: [u16; 40] = [
    1076, 1016, 960, 906, 856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, 428, 404,
    381, 360, 339, 320, 302, 285, 269, 254, 240, 226, 214, 202, 190, 180, 170, 160, 151, 143, 135,
    127, 120, 113,
];

/// Playback rate for a sound opcode pitch. Out-of-range pitches use the lowest note.
pub fn pitch_frequency(pitch: u8) -> u16 {
    let period = PERIODS.get(pitch as usize).copied().unwrap_or(PERIODS[0]);
    (PAULA_CARRIER / period as u32) as u16
}

pub fn clamp_volume(volume: u16) -> u8 {
    volume.min(MAX_VOLUME as u16) as u8
}

/// A sample resource ready to be played on one channel.
///
/// `data` holds the whole resource; the PCM starts after the 8-byte header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub resource: u16,
    pub frequency: u16,
    pub volume: u8,
    pub data: Arc<[u8]>,
    pub data_len: u32,
    pub loop_pos: u32,
    pub loop_len: u32,
}

impl Sample {
    pub fn parse(resource: u16, data: Arc<[u8]>, frequency: u16, volume: u8) -> Option<Self> {
        if data.len() < SAMPLE_HEADER_LEN {
            return None;
        }
        let word = |at: usize| u16::from_be_bytes([data[at], data[at + 1]]) as u32;
        let body_len = word(0) * 2;
        let loop_len = word(2) * 2;
        let (data_len, loop_pos) = if loop_len != 0 {
            (body_len + loop_len, body_len)
        } else {
            (body_len, 0)
        };
        Some(Self {
            resource,
            frequency,
            volume,
            data,
            data_len,
            loop_pos,
            loop_len,
        })
    }

    pub fn pcm(&self) -> &[u8] {
        let end = (SAMPLE_HEADER_LEN + self.data_len as usize).min(self.data.len());
        &self.data[SAMPLE_HEADER_LEN..end]
    }
}

/// Header of a tracker module resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicModule {
    pub resource: u16,
    pub ticks: u16,
    pub order_count: u16,
    pub order: Vec<u8>,
    /// Instrument slots as `(sound resource id, volume)`; id 0 is an empty slot.
    pub instruments: Vec<(u16, u16)>,
    pub data: Arc<[u8]>,
}

impl MusicModule {
    pub fn parse(resource: u16, data: Arc<[u8]>) -> Option<Self> {
        if data.len() < MUSIC_HEADER_LEN {
            return None;
        }
        let word = |at: usize| u16::from_be_bytes([data[at], data[at + 1]]);
        let instruments = (0..MUSIC_INSTRUMENTS)
            .map(|i| (word(2 + i * 4), word(4 + i * 4)))
            .collect();
        Some(Self {
            resource,
            ticks: word(0),
            order_count: word(0x3E),
            order: data[0x40..0x40 + MUSIC_ORDER_LEN].to_vec(),
            instruments,
            data,
        })
    }

    /// Pattern data following the header.
    pub fn patterns(&self) -> &[u8] {
        &self.data[MUSIC_HEADER_LEN..]
    }
}

/// What a `music` opcode asks for, before any resource lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCommand {
    Start { id: u16, position: u8, delay: u16 },
    Update { position: Option<u8>, delay: Option<u16> },
    Stop,
}

impl MusicCommand {
    pub fn classify(id: u16, position: u8, delay: u16) -> Self {
        let id = if id == 0 { 0xFFFF } else { id };
        if id != 0xFFFF {
            Self::Start {
                id,
                position,
                delay,
            }
        } else if position != 0 || delay != 0 {
            Self::Update {
                position: (position != 0).then_some(position),
                delay: (delay != 0).then_some(delay),
            }
        } else {
            Self::Stop
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicStart {
    pub module: MusicModule,
    pub position: u8,
    /// Tick length override; zero keeps the module's own.
    pub delay: u16,
    pub instruments: Vec<Option<Sample>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicRequest {
    Start(MusicStart),
    Update { position: Option<u8>, delay: Option<u16> },
    Stop,
}

pub trait AudioSink {
    fn play_sound(&mut self, channel: u8, sample: Sample);
    fn play_music(&mut self, request: MusicRequest);
    fn stop_all(&mut self);
}

/// Discards every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, channel: u8, sample: Sample) {
        trace!(channel, resource = sample.resource, "sound dropped");
    }

    fn play_music(&mut self, request: MusicRequest) {
        trace!(?request, "music dropped");
    }

    fn stop_all(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicState {
    pub module: MusicModule,
    pub position: u8,
    pub ticks: u16,
    pub instruments: Vec<Option<Sample>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioState {
    pub channels: [Option<Sample>; CHANNEL_COUNT],
    pub music: Option<MusicState>,
}

/// Channel bank shared with a host mixer callback.
///
/// Every mutation takes the lock for its own duration only.
#[derive(Debug, Clone, Default)]
pub struct SharedAudio {
    inner: Arc<Mutex<AudioState>>,
}

impl SharedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AudioState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> AudioState {
        self.lock().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut AudioState) -> R) -> R {
        f(&mut self.lock())
    }
}

impl AudioSink for SharedAudio {
    fn play_sound(&mut self, channel: u8, sample: Sample) {
        let slot = (channel & 3) as usize;
        debug!(channel = slot, resource = sample.resource, "play sound");
        self.lock().channels[slot] = Some(sample);
    }

    fn play_music(&mut self, request: MusicRequest) {
        let mut state = self.lock();
        match request {
            MusicRequest::Start(start) => {
                let ticks = if start.delay != 0 {
                    start.delay
                } else {
                    start.module.ticks
                };
                debug!(resource = start.module.resource, ticks, "start music");
                state.music = Some(MusicState {
                    module: start.module,
                    position: start.position,
                    ticks,
                    instruments: start.instruments,
                });
            }
            MusicRequest::Update { position, delay } => {
                if let Some(music) = state.music.as_mut() {
                    if let Some(position) = position {
                        music.position = position;
                    }
                    if let Some(delay) = delay {
                        music.ticks = delay;
                    }
                }
            }
            MusicRequest::Stop => state.music = None,
        }
    }

    fn stop_all(&mut self) {
        *self.lock() = AudioState::default();
    }
}
