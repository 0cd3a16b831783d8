use crate::opcode::PolygonBank;
use crate::parts::{GamePart, PART_FIRST_ID};
use crate::strings::Language;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RESOURCE_SLOTS: usize = 256;
pub const MANIFEST_FILE: &str = "resources.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Sound,
    Music,
    Bitmap,
    Palette,
    Bytecode,
    Polygon1,
    Polygon2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceState {
    #[default]
    NotNeeded,
    Loaded,
}

/// One entry of the resource table. The bytes are kept for the whole
/// session; `state` decides whether they are visible to the engine.
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: u8,
    pub kind: ResourceKind,
    pub state: ResourceState,
    bytes: Arc<[u8]>,
}

impl Resource {
    pub fn new(id: u8, kind: ResourceKind, bytes: Arc<[u8]>) -> Self {
        Self {
            id,
            kind,
            state: ResourceState::NotNeeded,
            bytes,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state == ResourceState::Loaded
    }

    /// Contents, if the resource is currently loaded.
    pub fn data(&self) -> Option<&Arc<[u8]>> {
        self.is_loaded().then_some(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of a `loadres` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The resource was not loaded and now is.
    Loaded(ResourceKind),
    /// Already loaded; bitmaps are redrawn by the caller.
    AlreadyLoaded(ResourceKind),
    PartRequested(GamePart),
    InvalidPart(u16),
    Missing,
}

/// Segments installed when a part starts.
#[derive(Debug, Clone)]
pub struct PartData {
    pub part: GamePart,
    pub palettes: Arc<[u8]>,
    pub bytecode: Arc<[u8]>,
    pub polygon1: Arc<[u8]>,
    pub polygon2: Option<Arc<[u8]>>,
}

/// Where the engine gets its data files from.
pub trait ResourceProvider {
    fn resource(&self, id: u8) -> Option<&Resource>;
    fn load_resource(&mut self, id: u16) -> LoadOutcome;
    /// Unload everything, then load the segments of `part`.
    fn load_part(&mut self, part: GamePart) -> Result<PartData>;
    fn polygon_data(&self, bank: PolygonBank) -> Option<&[u8]>;
    fn string(&self, id: u16) -> Option<&str>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u8,
    pub kind: ResourceKind,
    pub file: PathBuf,
}

/// `resources.json`: the resource table of a data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub resources: Vec<ManifestEntry>,
}

/// Resource table held fully in memory.
pub struct MemoryResources {
    entries: Vec<Option<Resource>>,
    language: Language,
    polygon1: Option<Arc<[u8]>>,
    polygon2: Option<Arc<[u8]>>,
}

impl Default for MemoryResources {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl MemoryResources {
    pub fn new(language: Language) -> Self {
        Self {
            entries: vec![None; RESOURCE_SLOTS],
            language,
            polygon1: None,
            polygon2: None,
        }
    }

    /// Read a data directory described by its `resources.json`.
    pub fn from_dir(dir: &Path, language: Language) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&manifest_path).map_err(|e| {
            CoreError::Config(format!("{}: {e}", manifest_path.display()))
        })?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let mut table = Self::new(language);
        for entry in &manifest.resources {
            let bytes = fs::read(dir.join(&entry.file))?;
            table.insert(entry.id, entry.kind, bytes);
        }
        info!(
            dir = %dir.display(),
            count = manifest.resources.len(),
            "resource table ready"
        );
        Ok(table)
    }

    pub fn insert(&mut self, id: u8, kind: ResourceKind, bytes: impl Into<Arc<[u8]>>) {
        self.entries[id as usize] = Some(Resource::new(id, kind, bytes.into()));
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.iter().flatten().filter(|r| r.is_loaded()).count()
    }

    fn invalidate_all(&mut self) {
        for entry in self.entries.iter_mut().flatten() {
            entry.state = ResourceState::NotNeeded;
        }
        self.polygon1 = None;
        self.polygon2 = None;
    }

    fn load_segment(&mut self, id: u8, part: GamePart) -> Result<Arc<[u8]>> {
        let entry = self.entries[id as usize]
            .as_mut()
            .ok_or(CoreError::MissingResource { id: id as u16 })?;
        entry.state = ResourceState::Loaded;
        debug!(id, kind = ?entry.kind, part = ?part, "segment loaded");
        Ok(entry.bytes.clone())
    }
}

impl ResourceProvider for MemoryResources {
    fn resource(&self, id: u8) -> Option<&Resource> {
        self.entries[id as usize].as_ref()
    }

    fn load_resource(&mut self, id: u16) -> LoadOutcome {
        if id >= RESOURCE_SLOTS as u16 {
            return match GamePart::from_id(id) {
                Some(part) => LoadOutcome::PartRequested(part),
                None => {
                    warn!(
                        id,
                        first = PART_FIRST_ID,
                        "requested part id out of range"
                    );
                    LoadOutcome::InvalidPart(id)
                }
            };
        }
        let Some(entry) = self.entries[id as usize].as_mut() else {
            warn!(id, "unknown resource");
            return LoadOutcome::Missing;
        };
        if entry.is_loaded() {
            return LoadOutcome::AlreadyLoaded(entry.kind);
        }
        entry.state = ResourceState::Loaded;
        debug!(id, kind = ?entry.kind, size = entry.len(), "resource loaded");
        LoadOutcome::Loaded(entry.kind)
    }

    fn load_part(&mut self, part: GamePart) -> Result<PartData> {
        self.invalidate_all();
        let spec = part.spec();
        let palettes = self.load_segment(spec.palettes, part)?;
        let bytecode = self.load_segment(spec.bytecode, part)?;
        let polygon1 = self.load_segment(spec.polygon1, part)?;
        let polygon2 = if spec.polygon2 != 0 {
            Some(self.load_segment(spec.polygon2, part)?)
        } else {
            None
        };
        self.polygon1 = Some(polygon1.clone());
        self.polygon2 = polygon2.clone();
        info!(part = spec.label, "part loaded");
        Ok(PartData {
            part,
            palettes,
            bytecode,
            polygon1,
            polygon2,
        })
    }

    fn polygon_data(&self, bank: PolygonBank) -> Option<&[u8]> {
        match bank {
            PolygonBank::Primary => self.polygon1.as_deref(),
            PolygonBank::Secondary => self.polygon2.as_deref(),
        }
    }

    fn string(&self, id: u16) -> Option<&str> {
        self.language.lookup(id)
    }
}
