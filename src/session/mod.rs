//! The persisted document shape: pure serialize/restore with no I/O.
//!
//! The session store collaborator owns where the payload lives; this module
//! owns what it looks like. Rasters travel as PNG bytes so the shape
//! round-trips exactly. History never persists; a restored document starts
//! with empty stacks.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::adjust::AdjustmentStep;
use crate::document::{ImageDocument, RestoredDocument};
use crate::overlay::TextOverlay;
use crate::raster::{self, RasterError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session raster could not be restored: {0}")]
    Raster(#[from] RasterError),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// One document as it sits in the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub id: String,
    pub name: String,
    pub dirty: bool,
    pub revision: u64,
    pub source_width: u32,
    pub source_height: u32,
    pub adjustment_steps: Vec<AdjustmentStep>,
    pub adjustment_base_png: Option<Vec<u8>>,
    pub original_png: Vec<u8>,
    pub working_png: Vec<u8>,
    pub overlays: Vec<TextOverlay>,
    pub overlay_selection: Option<usize>,
}

pub fn serialize_document(doc: &ImageDocument) -> SessionResult<SessionDocument> {
    let adjustment_base_png = match doc.adjustment_base() {
        Some(base) => Some(raster::encode_png(base)?),
        None => None,
    };
    let (source_width, source_height) = doc.source_dimensions();
    Ok(SessionDocument {
        id: doc.id().to_string(),
        name: doc.name().to_string(),
        dirty: doc.dirty(),
        revision: doc.revision(),
        source_width,
        source_height,
        adjustment_steps: doc.adjustment_steps().to_vec(),
        adjustment_base_png,
        original_png: doc.original_png().to_vec(),
        working_png: raster::encode_png(doc.working())?,
        overlays: doc.overlays().to_vec(),
        overlay_selection: doc.overlay_selection(),
    })
}

/// Rebuilds a document from a stored entry. The original and working
/// rasters must decode or no document is created. A damaged adjustment
/// base degrades gracefully: the chain is dropped and the working raster
/// kept, since the pixels already contain the applied steps.
pub fn restore_document(entry: SessionDocument) -> SessionResult<ImageDocument> {
    let original = raster::decode_png(&entry.original_png)?;
    let working = raster::decode_png(&entry.working_png)?;

    let id = match Uuid::parse_str(&entry.id) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!(id = %entry.id, "unparseable document id; assigning a new one");
            Uuid::new_v4()
        }
    };

    let adjustment_base = match &entry.adjustment_base_png {
        Some(bytes) => match raster::decode_png(bytes) {
            Ok(base) => Some(base),
            Err(err) => {
                tracing::warn!(error = %err, "adjustment base unreadable; dropping the chain");
                None
            }
        },
        None => None,
    };
    let adjustment_steps: Vec<AdjustmentStep> = entry
        .adjustment_steps
        .iter()
        .map(|step| step.normalized())
        .collect();
    // A chain without a base cannot replay; keep the baked-in pixels and
    // forget the orphaned steps.
    let (adjustment_base, adjustment_steps) = if adjustment_base.is_some() {
        (adjustment_base, adjustment_steps)
    } else {
        if !adjustment_steps.is_empty() {
            tracing::warn!(
                steps = adjustment_steps.len(),
                "adjustment steps without a base; dropping them"
            );
        }
        (None, Vec::new())
    };

    Ok(ImageDocument::from_restored(RestoredDocument {
        id,
        name: entry.name,
        original,
        original_png: entry.original_png,
        working,
        adjustment_base,
        adjustment_steps,
        overlays: entry.overlays,
        overlay_selection: entry.overlay_selection,
        revision: entry.revision,
        dirty: entry.dirty,
        source_width: entry.source_width,
        source_height: entry.source_height,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_document;
    use crate::geometry::PixelRect;

    fn edited_document() -> ImageDocument {
        let mut doc = test_document(24, 24);
        doc.append_adjustment(AdjustmentStep::new(130, 110, 90, 1))
            .expect("adjustment should commit");
        doc.set_detections(vec![TextOverlay::new(
            PixelRect::new(2, 2, 10, 5),
            "token",
            0.87,
        )]);
        doc
    }

    #[test]
    fn session_shape_round_trips_exactly() {
        let doc = edited_document();
        let entry = serialize_document(&doc).expect("serialize");

        let json = serde_json::to_string(&entry).expect("session shape is json");
        let parsed: SessionDocument = serde_json::from_str(&json).expect("parse back");
        assert_eq!(parsed, entry);

        let restored = restore_document(parsed).expect("restore");
        let entry_again = serialize_document(&restored).expect("serialize again");
        assert_eq!(entry_again, entry);
    }

    #[test]
    fn restore_preserves_identity_and_state() {
        let doc = edited_document();
        let id = doc.id();
        let revision = doc.revision();
        let entry = serialize_document(&doc).expect("serialize");

        let restored = restore_document(entry).expect("restore");
        assert_eq!(restored.id(), id);
        assert_eq!(restored.revision(), revision);
        assert!(restored.dirty());
        assert_eq!(restored.working(), doc.working());
        assert_eq!(restored.original(), doc.original());
        assert_eq!(restored.adjustment_steps(), doc.adjustment_steps());
        assert_eq!(restored.overlays(), doc.overlays());
        // History is intentionally not persisted.
        assert_eq!(restored.history_len(), 0);
        assert_eq!(restored.future_len(), 0);
    }

    #[test]
    fn unreadable_working_raster_fails_the_restore() {
        let doc = edited_document();
        let mut entry = serialize_document(&doc).expect("serialize");
        entry.working_png = vec![9, 9, 9];
        assert!(matches!(
            restore_document(entry),
            Err(SessionError::Raster(_))
        ));
    }

    #[test]
    fn damaged_adjustment_base_drops_the_chain_but_keeps_pixels() {
        let doc = edited_document();
        let working = doc.working().clone();
        let mut entry = serialize_document(&doc).expect("serialize");
        entry.adjustment_base_png = Some(vec![1, 2, 3]);

        let restored = restore_document(entry).expect("restore succeeds");
        assert!(restored.adjustment_steps().is_empty());
        assert!(restored.adjustment_base().is_none());
        assert_eq!(restored.working(), &working);
    }

    #[test]
    fn orphaned_steps_without_a_base_are_dropped() {
        let doc = edited_document();
        let mut entry = serialize_document(&doc).expect("serialize");
        entry.adjustment_base_png = None;

        let restored = restore_document(entry).expect("restore succeeds");
        assert!(restored.adjustment_steps().is_empty());
    }

    #[test]
    fn garbage_id_gets_replaced_instead_of_failing() {
        let doc = test_document(8, 8);
        let mut entry = serialize_document(&doc).expect("serialize");
        entry.id = "not-a-uuid".to_string();
        let restored = restore_document(entry).expect("restore succeeds");
        assert_ne!(restored.id().to_string(), "not-a-uuid");
    }
}
