//! The per-image document model: owned rasters, the adjustment chain,
//! bounded history, text overlays, and the owning multi-document store.

mod adjustments;
mod edits;
mod history;
mod overlays;

pub use history::{HistorySnapshot, HISTORY_LIMIT};

use image::RgbaImage;
use thiserror::Error;
use uuid::Uuid;

use crate::adjust::AdjustmentStep;
use crate::overlay::{StampError, TextOverlay};
use crate::raster::{self, RasterError, RasterResult};

/// Most documents the store will hold at once.
pub const MAX_DOCUMENTS: usize = 20;
/// Budget across all working rasters in the store, keeping total residency
/// bounded no matter how large individual imports are.
pub const MAX_TOTAL_PIXELS: u64 = 120_000_000;

const FILE_NAME_MAX_LEN: usize = 120;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("adjustment step index {index} out of range ({len} steps)")]
    InvalidStepIndex { index: usize, len: usize },
    #[error("text overlay index {index} out of range ({len} overlays)")]
    InvalidOverlayIndex { index: usize, len: usize },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("adjustment step is neutral; nothing to apply")]
    NoOpAdjustment,
    #[error("history snapshot could not be restored: {0}")]
    SnapshotRestore(#[source] RasterError),
    #[error("text stamp rejected: {0}")]
    Stamp(#[from] StampError),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

pub type EditResult<T> = std::result::Result<T, EditError>;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document limit of {max} reached")]
    TooManyDocuments { max: usize },
    #[error("pixel budget exceeded: {requested} pixels over a budget of {budget}")]
    PixelBudgetExceeded { requested: u64, budget: u64 },
    #[error("document index {index} out of range ({len} documents)")]
    InvalidDocumentIndex { index: usize, len: usize },
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// One loaded image and everything editable about it. Rasters are owned
/// exclusively; no two documents ever share a buffer.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    id: Uuid,
    name: String,
    original: RgbaImage,
    original_png: Vec<u8>,
    working: RgbaImage,
    adjustment_base: Option<RgbaImage>,
    adjustment_steps: Vec<AdjustmentStep>,
    history: Vec<HistorySnapshot>,
    future: Vec<HistorySnapshot>,
    overlays: Vec<TextOverlay>,
    overlay_selection: Option<usize>,
    revision: u64,
    dirty: bool,
    source_width: u32,
    source_height: u32,
}

impl ImageDocument {
    /// Wraps a freshly decoded raster. The decode collaborator either
    /// delivers a complete raster or the document is never created.
    pub fn from_raster(name: impl Into<String>, decoded: RgbaImage) -> RasterResult<Self> {
        let original_png = raster::encode_png(&decoded)?;
        let (source_width, source_height) = decoded.dimensions();
        Ok(Self {
            id: Uuid::new_v4(),
            name: sanitize_file_name(&name.into()),
            original: decoded.clone(),
            original_png,
            working: decoded,
            adjustment_base: None,
            adjustment_steps: Vec::new(),
            history: Vec::new(),
            future: Vec::new(),
            overlays: Vec::new(),
            overlay_selection: None,
            revision: 0,
            dirty: false,
            source_width,
            source_height,
        })
    }

    pub(crate) fn from_restored(parts: RestoredDocument) -> Self {
        let overlay_selection = match parts.overlay_selection {
            Some(index) if !parts.overlays.is_empty() => {
                Some(index.min(parts.overlays.len() - 1))
            }
            _ => None,
        };
        Self {
            id: parts.id,
            name: sanitize_file_name(&parts.name),
            original: parts.original,
            original_png: parts.original_png,
            working: parts.working,
            adjustment_base: parts.adjustment_base,
            adjustment_steps: parts.adjustment_steps,
            history: Vec::new(),
            future: Vec::new(),
            overlays: parts.overlays,
            overlay_selection,
            revision: parts.revision,
            dirty: parts.dirty,
            source_width: parts.source_width,
            source_height: parts.source_height,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the document. Returns false when the sanitized name is empty
    /// or unchanged.
    pub fn rename(&mut self, name: &str) -> bool {
        let next = sanitize_file_name(name);
        if next.is_empty() || next == self.name {
            return false;
        }
        self.name = next;
        true
    }

    pub fn width(&self) -> u32 {
        self.working.width()
    }

    pub fn height(&self) -> u32 {
        self.working.height()
    }

    pub fn pixel_count(&self) -> u64 {
        raster::pixel_count(&self.working)
    }

    /// Whether the throttled render budget and tiled filtering apply.
    pub fn is_large(&self) -> bool {
        raster::is_large(&self.working)
    }

    pub fn working(&self) -> &RgbaImage {
        &self.working
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    pub(crate) fn original_png(&self) -> &[u8] {
        &self.original_png
    }

    /// Read-only view for export encoders; exporting never mutates state.
    pub fn export_view(&self) -> &RgbaImage {
        &self.working
    }

    pub fn adjustment_steps(&self) -> &[AdjustmentStep] {
        &self.adjustment_steps
    }

    pub fn adjustment_base(&self) -> Option<&RgbaImage> {
        self.adjustment_base.as_ref()
    }

    pub fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    pub fn overlay_selection(&self) -> Option<usize> {
        self.overlay_selection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Flags the working raster as diverged and bumps the revision so
    /// derived caches (thumbnails and the like) refresh.
    pub(crate) fn mark_modified(&mut self) {
        self.dirty = true;
        self.revision = self.revision.saturating_add(1);
    }

    /// Recomputes `dirty` by content comparison against the import-time
    /// raster: a dimension mismatch is always dirty, otherwise the encoded
    /// bytes decide.
    pub(crate) fn refresh_dirty(&mut self) -> RasterResult<()> {
        self.dirty = self.encoded_working_differs_from_original()?;
        Ok(())
    }

    fn encoded_working_differs_from_original(&self) -> RasterResult<bool> {
        if self.working.dimensions() != self.original.dimensions() {
            return Ok(true);
        }
        Ok(raster::encode_png(&self.working)? != self.original_png)
    }
}

fn sanitize_file_name(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    let mut last_was_space = false;
    for c in value.trim().chars() {
        let mapped = match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => ' ',
            c => c,
        };
        if mapped == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        cleaned.push(mapped);
    }
    cleaned.chars().take(FILE_NAME_MAX_LEN).collect()
}

/// Field bundle for rebuilding a document from persisted state. History is
/// deliberately absent; restored documents start with empty stacks.
pub(crate) struct RestoredDocument {
    pub id: Uuid,
    pub name: String,
    pub original: RgbaImage,
    pub original_png: Vec<u8>,
    pub working: RgbaImage,
    pub adjustment_base: Option<RgbaImage>,
    pub adjustment_steps: Vec<AdjustmentStep>,
    pub overlays: Vec<TextOverlay>,
    pub overlay_selection: Option<usize>,
    pub revision: u64,
    pub dirty: bool,
    pub source_width: u32,
    pub source_height: u32,
}

/// The open documents and which one edits apply to. The active selection is
/// always a valid index while any document exists.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<ImageDocument>,
    active: Option<usize>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn total_working_pixels(&self) -> u64 {
        self.documents.iter().map(ImageDocument::pixel_count).sum()
    }

    /// Adds a document and makes it active.
    pub fn add(&mut self, document: ImageDocument) -> DocumentResult<usize> {
        admission_check(
            self.documents.len(),
            self.total_working_pixels(),
            document.pixel_count(),
        )?;
        self.documents.push(document);
        let index = self.documents.len() - 1;
        self.active = Some(index);
        Ok(index)
    }

    /// Removes a document, keeping the active selection on a valid index.
    pub fn remove(&mut self, index: usize) -> DocumentResult<ImageDocument> {
        if index >= self.documents.len() {
            return Err(DocumentError::InvalidDocumentIndex {
                index,
                len: self.documents.len(),
            });
        }
        let removed = self.documents.remove(index);
        self.active = if self.documents.is_empty() {
            None
        } else {
            let current = self.active.unwrap_or(0);
            let shifted = if current > index { current - 1 } else { current };
            Some(shifted.min(self.documents.len() - 1))
        };
        Ok(removed)
    }

    pub fn set_active(&mut self, index: usize) -> DocumentResult<()> {
        if index >= self.documents.len() {
            return Err(DocumentError::InvalidDocumentIndex {
                index,
                len: self.documents.len(),
            });
        }
        self.active = Some(index);
        Ok(())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&ImageDocument> {
        self.active.and_then(|index| self.documents.get(index))
    }

    pub fn active_mut(&mut self) -> Option<&mut ImageDocument> {
        match self.active {
            Some(index) => self.documents.get_mut(index),
            None => None,
        }
    }

    pub fn get(&self, index: usize) -> Option<&ImageDocument> {
        self.documents.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ImageDocument> {
        self.documents.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageDocument> {
        self.documents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ImageDocument> {
        self.documents.iter_mut()
    }
}

fn admission_check(count: usize, current_pixels: u64, incoming: u64) -> DocumentResult<()> {
    if count >= MAX_DOCUMENTS {
        return Err(DocumentError::TooManyDocuments { max: MAX_DOCUMENTS });
    }
    let requested = current_pixels.saturating_add(incoming);
    if requested > MAX_TOTAL_PIXELS {
        return Err(DocumentError::PixelBudgetExceeded {
            requested,
            budget: MAX_TOTAL_PIXELS,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_raster(width: u32, height: u32) -> RgbaImage {
    use image::Rgba;
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            ((x * 5 + y) % 256) as u8,
            ((y * 7 + x) % 256) as u8,
            ((x + y * 3) % 256) as u8,
            255,
        ])
    })
}

#[cfg(test)]
pub(crate) fn test_document(width: u32, height: u32) -> ImageDocument {
    ImageDocument::from_raster("test.png", test_raster(width, height))
        .expect("test raster should encode")
}
