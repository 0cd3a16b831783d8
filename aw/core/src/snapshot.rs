use crate::palette::PaletteMode;
use crate::parts::GamePart;
use crate::registers::REGISTER_COUNT;
use crate::vm::VmState;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Seek, Write};
use std::time::{SystemTime, UNIX_EPOCH};
use zip::read::ZipArchive;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SNAPSHOT_MAGIC: &str = "aw.snapshot";
pub const SNAPSHOT_VERSION: u32 = 1;

const METADATA_ENTRY: &str = "snapshot.json";
const REGISTERS_ENTRY: &str = "registers.bin";
const PAGES_ENTRY: &str = "pages.bin";

/// Contents of `snapshot.json`. Register values and page memory live in
/// their own archive entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub magic: String,
    pub version: u32,
    pub created: String,
    pub part: GamePart,
    pub palette_mode: PaletteMode,
    #[serde(default)]
    pub loaded_resources: Vec<u8>,
    pub vm: VmState,
    pub video: Value,
}

impl Default for SnapshotMetadata {
    fn default() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC.to_string(),
            version: SNAPSHOT_VERSION,
            created: now_timestamp(),
            part: GamePart::default(),
            palette_mode: PaletteMode::default(),
            loaded_resources: Vec::new(),
            vm: VmState {
                registers: Vec::new(),
                threads: Vec::new(),
                pending: Vec::new(),
                clock: Default::default(),
                tick_count: 0,
            },
            video: Value::Null,
        }
    }
}

#[derive(Debug)]
pub struct SnapshotLoad {
    pub metadata: SnapshotMetadata,
    pub pages: Vec<u8>,
}

fn now_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs.to_string()
}

pub fn pack_registers(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn unpack_registers(payload: &[u8]) -> Result<Vec<u16>> {
    let expected = REGISTER_COUNT * 2;
    if payload.len() != expected {
        return Err(CoreError::InvalidSnapshot(format!(
            "{REGISTERS_ENTRY} length mismatch (expected {expected}, got {})",
            payload.len()
        )));
    }
    Ok(payload
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

pub fn write_snapshot<W: Write + Seek>(
    writer: W,
    metadata: &SnapshotMetadata,
    pages: &[u8],
) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let registers = pack_registers(&metadata.vm.registers);
    let mut meta = metadata.clone();
    meta.vm.registers.clear();

    zip.start_file(METADATA_ENTRY, options)?;
    zip.write_all(&serde_json::to_vec_pretty(&meta)?)?;

    zip.start_file(REGISTERS_ENTRY, options)?;
    zip.write_all(&registers)?;

    zip.start_file(PAGES_ENTRY, options)?;
    zip.write_all(pages)?;

    zip.finish()?;
    Ok(())
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| CoreError::InvalidSnapshot(format!("{name} missing: {e}")))?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn read_snapshot<R: Read + Seek>(reader: R) -> Result<SnapshotLoad> {
    let mut archive = ZipArchive::new(reader)?;

    let mut metadata: SnapshotMetadata =
        serde_json::from_slice(&read_entry(&mut archive, METADATA_ENTRY)?)?;
    if metadata.magic != SNAPSHOT_MAGIC || metadata.version != SNAPSHOT_VERSION {
        return Err(CoreError::InvalidSnapshot(
            "snapshot magic/version mismatch".to_string(),
        ));
    }
    metadata.vm.registers = unpack_registers(&read_entry(&mut archive, REGISTERS_ENTRY)?)?;
    let pages = read_entry(&mut archive, PAGES_ENTRY)?;

    Ok(SnapshotLoad { metadata, pages })
}
