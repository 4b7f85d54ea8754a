//! Bounded raster-snapshot history with undo/redo.
//!
//! Every mutating operation pushes a snapshot of the pre-operation state
//! before anything moves, so the stacks always describe "where you can go
//! back to". Snapshots hold the encoded frame plus the auxiliary metadata
//! that must travel with it (overlays, selection, the adjustment chain);
//! restoring decodes everything first, which makes a failed restore leave
//! the document untouched.

use image::RgbaImage;

use super::{EditError, EditResult, ImageDocument};
use crate::adjust::AdjustmentStep;
use crate::overlay::TextOverlay;
use crate::raster::{self, RasterResult};

pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    raster_png: Vec<u8>,
    label: String,
    overlays: Vec<TextOverlay>,
    overlay_selection: Option<usize>,
    adjustment_steps: Vec<AdjustmentStep>,
    adjustment_base_png: Option<Vec<u8>>,
}

impl HistorySnapshot {
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Raster and chain base decoded out of a snapshot before a restore
/// commits.
struct DecodedSnapshot {
    raster: RgbaImage,
    adjustment_base: Option<RgbaImage>,
    label: String,
}

impl ImageDocument {
    fn capture_snapshot(&self, label: String) -> RasterResult<HistorySnapshot> {
        let adjustment_base_png = match &self.adjustment_base {
            Some(base) => Some(raster::encode_png(base)?),
            None => None,
        };
        Ok(HistorySnapshot {
            raster_png: raster::encode_png(&self.working)?,
            label,
            overlays: self.overlays.clone(),
            overlay_selection: self.overlay_selection,
            adjustment_steps: self.adjustment_steps.clone(),
            adjustment_base_png,
        })
    }

    /// Records the current state as the newest undo entry. The oldest entry
    /// falls off past [`HISTORY_LIMIT`]; any redo entries become stale and
    /// are dropped.
    pub fn push_history(&mut self, label: &str) -> EditResult<()> {
        let snapshot = self.capture_snapshot(label.to_string())?;
        self.history.push(snapshot);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.future.clear();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Label of the operation `undo` would roll back, for button tooltips.
    pub fn next_undo_label(&self) -> Option<&str> {
        self.history.last().map(HistorySnapshot::label)
    }

    pub fn next_redo_label(&self) -> Option<&str> {
        self.future.last().map(HistorySnapshot::label)
    }

    /// Rolls back to the newest snapshot. The state being left is captured
    /// onto the redo stack first, so `redo` restores it byte for byte.
    pub fn undo(&mut self) -> EditResult<String> {
        let decoded = match self.history.last() {
            Some(entry) => decode_snapshot(entry)?,
            None => return Err(EditError::NothingToUndo),
        };
        // All fallible work happens above this line; from here the restore
        // commits as one unit.
        let forward = self.capture_snapshot(decoded.label.clone())?;
        let next_dirty = self.dirty_against_original(&decoded.raster)?;
        let Some(entry) = self.history.pop() else {
            return Err(EditError::NothingToUndo);
        };
        self.future.push(forward);
        let label = decoded.label.clone();
        self.commit_restore(decoded, entry, next_dirty);
        tracing::debug!(label = %label, "undo applied");
        Ok(label)
    }

    /// Replays the newest redo snapshot, pushing the state being left back
    /// onto the undo stack (the depth cap applies there too).
    pub fn redo(&mut self) -> EditResult<String> {
        let decoded = match self.future.last() {
            Some(entry) => decode_snapshot(entry)?,
            None => return Err(EditError::NothingToRedo),
        };
        let backward = self.capture_snapshot(decoded.label.clone())?;
        let next_dirty = self.dirty_against_original(&decoded.raster)?;
        let Some(entry) = self.future.pop() else {
            return Err(EditError::NothingToRedo);
        };
        self.history.push(backward);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        let label = decoded.label.clone();
        self.commit_restore(decoded, entry, next_dirty);
        tracing::debug!(label = %label, "redo applied");
        Ok(label)
    }

    fn commit_restore(&mut self, decoded: DecodedSnapshot, entry: HistorySnapshot, dirty: bool) {
        self.working = decoded.raster;
        self.overlays = entry.overlays;
        self.overlay_selection = restored_selection(entry.overlay_selection, self.overlays.len());
        // The chain cached before the restore no longer matches the raster;
        // the snapshot's own chain replaces it wholesale.
        self.adjustment_steps = entry.adjustment_steps;
        self.adjustment_base = decoded.adjustment_base;
        self.revision = self.revision.saturating_add(1);
        self.dirty = dirty;
    }

    fn dirty_against_original(&self, candidate: &RgbaImage) -> RasterResult<bool> {
        if candidate.dimensions() != self.original.dimensions() {
            return Ok(true);
        }
        Ok(raster::encode_png(candidate)? != self.original_png)
    }
}

fn decode_snapshot(entry: &HistorySnapshot) -> EditResult<DecodedSnapshot> {
    let raster = raster::decode_png(&entry.raster_png).map_err(EditError::SnapshotRestore)?;
    let adjustment_base = match &entry.adjustment_base_png {
        Some(bytes) => Some(raster::decode_png(bytes).map_err(EditError::SnapshotRestore)?),
        None => None,
    };
    Ok(DecodedSnapshot {
        raster,
        adjustment_base,
        label: entry.label.clone(),
    })
}

fn restored_selection(selection: Option<usize>, overlay_count: usize) -> Option<usize> {
    if overlay_count == 0 {
        None
    } else {
        Some(selection.unwrap_or(0).min(overlay_count - 1))
    }
}
