//! Overlay bookkeeping on the document: detection results, selection,
//! hit-testing, and drag positioning. Overlays are metadata until a
//! replace or bake operation stamps pixels (see `edits.rs`).

use super::{EditError, EditResult, ImageDocument};
use crate::geometry::CanvasPoint;
use crate::overlay::{self, TextOverlay};

impl ImageDocument {
    /// Replaces the overlay list with fresh detection results. The first
    /// token starts selected so the edit panel has a target.
    pub fn set_detections(&mut self, detections: Vec<TextOverlay>) {
        self.overlay_selection = if detections.is_empty() { None } else { Some(0) };
        self.overlays = detections;
        tracing::debug!(count = self.overlays.len(), "text detections stored");
    }

    pub(crate) fn clear_overlays_silent(&mut self) {
        self.overlays.clear();
        self.overlay_selection = None;
    }

    /// Clears all overlays as an undoable operation. Returns false when
    /// there was nothing to clear (and nothing is pushed).
    pub fn clear_overlays_recorded(&mut self) -> EditResult<bool> {
        if self.overlays.is_empty() {
            return Ok(false);
        }
        self.push_history("Clear text boxes")?;
        self.clear_overlays_silent();
        Ok(true)
    }

    /// Selects an overlay, clamping into range. Returns the resolved index,
    /// or `None` when no overlays exist.
    pub fn select_overlay(&mut self, index: usize) -> Option<usize> {
        if self.overlays.is_empty() {
            self.overlay_selection = None;
            return None;
        }
        let resolved = index.min(self.overlays.len() - 1);
        self.overlay_selection = Some(resolved);
        Some(resolved)
    }

    /// The overlay under `point`, with per-box hit slack; among several hits
    /// the one whose center is nearest wins.
    pub fn overlay_at_point(&self, point: CanvasPoint) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, overlay) in self.overlays.iter().enumerate().rev() {
            if !overlay::overlay_contains(overlay.bounds, point) {
                continue;
            }
            let center = overlay.bounds.center();
            let dx = point.x - center.x;
            let dy = point.y - center.y;
            let score = dx * dx + dy * dy;
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Where `(x, y)` lands once clamped so the overlay stays fully on
    /// canvas.
    fn clamped_overlay_target(&self, index: usize, x: i32, y: i32) -> EditResult<(u32, u32)> {
        let len = self.overlays.len();
        let Some(overlay) = self.overlays.get(index) else {
            return Err(EditError::InvalidOverlayIndex { index, len });
        };
        let max_x = self.working.width().saturating_sub(overlay.bounds.w);
        let max_y = self.working.height().saturating_sub(overlay.bounds.h);
        let next_x = i64::from(x).clamp(0, i64::from(max_x)) as u32;
        let next_y = i64::from(y).clamp(0, i64::from(max_y)) as u32;
        Ok((next_x, next_y))
    }

    /// Moves an overlay box so it stays fully on canvas. Returns whether
    /// the position changed. History is the caller's concern: drags push
    /// once on first movement, not per event.
    pub fn move_overlay(&mut self, index: usize, x: i32, y: i32) -> EditResult<bool> {
        let (next_x, next_y) = self.clamped_overlay_target(index, x, y)?;
        let overlay = &mut self.overlays[index];
        if next_x == overlay.bounds.x && next_y == overlay.bounds.y {
            return Ok(false);
        }
        overlay.bounds.x = next_x;
        overlay.bounds.y = next_y;
        Ok(true)
    }

    /// Moves an overlay as a standalone undoable operation (position
    /// fields, nudge buttons). A same-position request pushes nothing.
    pub fn move_overlay_recorded(&mut self, index: usize, x: i32, y: i32) -> EditResult<bool> {
        let (next_x, next_y) = self.clamped_overlay_target(index, x, y)?;
        let bounds = self.overlays[index].bounds;
        if next_x == bounds.x && next_y == bounds.y {
            return Ok(false);
        }
        self.push_history("Move text box")?;
        let overlay = &mut self.overlays[index];
        overlay.bounds.x = next_x;
        overlay.bounds.y = next_y;
        Ok(true)
    }

    /// Centers an overlay on the canvas as an undoable operation.
    pub fn center_overlay(&mut self, index: usize) -> EditResult<bool> {
        let len = self.overlays.len();
        let Some(overlay) = self.overlays.get(index) else {
            return Err(EditError::InvalidOverlayIndex { index, len });
        };
        let x = (i64::from(self.working.width()) - i64::from(overlay.bounds.w)) / 2;
        let y = (i64::from(self.working.height()) - i64::from(overlay.bounds.h)) / 2;
        self.move_overlay_recorded(
            index,
            x.clamp(0, i64::from(i32::MAX)) as i32,
            y.clamp(0, i64::from(i32::MAX)) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_document;
    use super::*;
    use crate::geometry::PixelRect;

    fn with_overlays() -> ImageDocument {
        let mut doc = test_document(100, 100);
        doc.set_detections(vec![
            TextOverlay::new(PixelRect::new(10, 10, 30, 12), "alpha", 0.9),
            TextOverlay::new(PixelRect::new(30, 14, 30, 12), "beta", 0.7),
        ]);
        doc
    }

    #[test]
    fn set_detections_selects_the_first_token() {
        let doc = with_overlays();
        assert_eq!(doc.overlay_selection(), Some(0));

        let mut empty = test_document(10, 10);
        empty.set_detections(Vec::new());
        assert_eq!(empty.overlay_selection(), None);
    }

    #[test]
    fn select_overlay_clamps_into_range() {
        let mut doc = with_overlays();
        assert_eq!(doc.select_overlay(99), Some(1));
        assert_eq!(doc.overlay_selection(), Some(1));
    }

    #[test]
    fn overlay_hit_prefers_the_nearest_center() {
        let doc = with_overlays();
        // (36, 18) is inside both boxes; beta's center (45, 20) is closer
        // than alpha's (25, 16).
        assert_eq!(doc.overlay_at_point(CanvasPoint::new(36.0, 18.0)), Some(1));
        assert_eq!(doc.overlay_at_point(CanvasPoint::new(12.0, 12.0)), Some(0));
        assert_eq!(doc.overlay_at_point(CanvasPoint::new(90.0, 90.0)), None);
    }

    #[test]
    fn overlay_hit_honors_tolerance_outside_the_box() {
        let doc = with_overlays();
        // min side 12 -> tolerance 3; x = 7 is within slack of alpha.
        assert_eq!(doc.overlay_at_point(CanvasPoint::new(7.0, 10.0)), Some(0));
        assert_eq!(doc.overlay_at_point(CanvasPoint::new(5.0, 10.0)), None);
    }

    #[test]
    fn move_overlay_clamps_to_canvas_bounds() {
        let mut doc = with_overlays();
        let moved = doc.move_overlay(0, 500, -40).expect("index valid");
        assert!(moved);
        let bounds = doc.overlays()[0].bounds;
        assert_eq!(bounds.x, 70); // 100 - 30
        assert_eq!(bounds.y, 0);
    }

    #[test]
    fn recorded_move_pushes_exactly_one_entry_and_skips_no_ops() {
        let mut doc = with_overlays();
        let moved = doc.move_overlay_recorded(0, 20, 20).expect("index valid");
        assert!(moved);
        assert_eq!(doc.history_len(), 1);
        assert_eq!(doc.next_undo_label(), Some("Move text box"));

        let moved = doc.move_overlay_recorded(0, 20, 20).expect("index valid");
        assert!(!moved);
        assert_eq!(doc.history_len(), 1);
    }

    #[test]
    fn center_overlay_lands_in_the_middle() {
        let mut doc = with_overlays();
        doc.center_overlay(0).expect("index valid");
        let bounds = doc.overlays()[0].bounds;
        assert_eq!(bounds.x, 35); // (100 - 30) / 2
        assert_eq!(bounds.y, 44); // (100 - 12) / 2
    }

    #[test]
    fn clear_recorded_is_undoable_and_skips_empty() {
        let mut doc = with_overlays();
        assert!(doc.clear_overlays_recorded().expect("clear"));
        assert!(doc.overlays().is_empty());
        assert_eq!(doc.overlay_selection(), None);

        doc.undo().expect("undo restores overlays");
        assert_eq!(doc.overlays().len(), 2);

        let mut empty = test_document(10, 10);
        assert!(!empty.clear_overlays_recorded().expect("nothing to clear"));
        assert_eq!(empty.history_len(), 0);
    }

    #[test]
    fn detection_results_flow_through_the_detector_seam() {
        use crate::overlay::{DetectError, TextDetector};
        use image::RgbaImage;

        struct FixedDetector;

        impl TextDetector for FixedDetector {
            fn detect(&self, raster: &RgbaImage) -> Result<Vec<TextOverlay>, DetectError> {
                Ok(vec![TextOverlay::new(
                    PixelRect::new(0, 0, raster.width() / 2, 8),
                    "found",
                    0.95,
                )])
            }
        }

        let mut doc = test_document(40, 40);
        let found = FixedDetector
            .detect(doc.working())
            .expect("detector should report");
        doc.set_detections(found);
        assert_eq!(doc.overlays().len(), 1);
        assert_eq!(doc.overlays()[0].text, "found");
        assert_eq!(doc.overlays()[0].bounds.w, 20);
        assert_eq!(doc.overlay_selection(), Some(0));
    }

    #[test]
    fn overlay_index_errors_are_reported() {
        let mut doc = test_document(10, 10);
        assert!(matches!(
            doc.move_overlay(3, 0, 0),
            Err(EditError::InvalidOverlayIndex { index: 3, len: 0 })
        ));
    }
}
