//! Direct raster edits: operations that change pixels outside the
//! adjustment-replay mechanism. Each one snapshots history first, drops any
//! cached adjustment chain, and replaces the working bitmap as one unit.

use super::{EditError, EditResult, ImageDocument};
use crate::geometry::{CanvasPoint, PixelRect};
use crate::overlay::{StampError, StampRequest, TextStamper, TextStrictness};
use crate::raster::{self, FlipAxis, ResizeFit, ResizeMethod, RotationDirection};
use crate::tool::{BrushSettings, StrokeRenderer, ToolKind};

impl ImageDocument {
    fn begin_direct_edit(&mut self, label: &str) -> EditResult<()> {
        self.push_history(label)?;
        self.invalidate_adjustments();
        Ok(())
    }

    /// Opens a drawing gesture: one history entry covers every segment
    /// streamed until the pointer lifts.
    pub fn begin_brush_gesture(&mut self, tool: ToolKind) -> EditResult<()> {
        self.begin_direct_edit(tool.gesture_label())
    }

    /// Applies one stroke segment through the drawing collaborator.
    pub fn apply_stroke_segment(
        &mut self,
        renderer: &impl StrokeRenderer,
        from: CanvasPoint,
        to: CanvasPoint,
        tool: ToolKind,
        brush: &BrushSettings,
    ) {
        renderer.draw_stroke(&mut self.working, from, to, tool, brush);
        self.mark_modified();
    }

    pub fn rotate_quarter(&mut self, direction: RotationDirection) -> EditResult<()> {
        let label = match direction {
            RotationDirection::Clockwise => "Rotate right",
            RotationDirection::CounterClockwise => "Rotate left",
        };
        self.begin_direct_edit(label)?;
        self.working = raster::rotate_quarter(&self.working, direction);
        self.mark_modified();
        self.clear_overlays_silent();
        Ok(())
    }

    pub fn flip(&mut self, axis: FlipAxis) -> EditResult<()> {
        let label = match axis {
            FlipAxis::Horizontal => "Flip horizontal",
            FlipAxis::Vertical => "Flip vertical",
        };
        self.begin_direct_edit(label)?;
        self.working = raster::flip(&self.working, axis);
        self.mark_modified();
        self.clear_overlays_silent();
        Ok(())
    }

    /// Resamples the working bitmap. Asking for the current size with
    /// stretch fit is a quiet no-op.
    pub fn resize_to(
        &mut self,
        target_w: u32,
        target_h: u32,
        method: ResizeMethod,
        fit: ResizeFit,
    ) -> EditResult<()> {
        let target_w = target_w.max(1);
        let target_h = target_h.max(1);
        if target_w == self.width() && target_h == self.height() && fit == ResizeFit::Stretch {
            return Ok(());
        }
        self.begin_direct_edit("Resize")?;
        self.working = raster::resize(&self.working, target_w, target_h, method, fit);
        self.mark_modified();
        self.clear_overlays_silent();
        tracing::debug!(
            width = target_w,
            height = target_h,
            method = method.label(),
            fit = fit.label(),
            "resize applied"
        );
        Ok(())
    }

    /// Discards every edit and returns to the import raster.
    pub fn reset_to_original(&mut self) -> EditResult<()> {
        self.begin_direct_edit("Reset to original")?;
        self.working = self.original.clone();
        self.revision = self.revision.saturating_add(1);
        self.dirty = false;
        self.clear_overlays_silent();
        Ok(())
    }

    /// Crops to a committed selection rect. The rect is validated against
    /// the current frame before any state moves.
    pub fn apply_crop(&mut self, rect: PixelRect) -> EditResult<()> {
        let cropped = raster::crop(&self.working, rect)?;
        self.begin_direct_edit("Crop")?;
        self.working = cropped;
        self.mark_modified();
        self.clear_overlays_silent();
        tracing::debug!(?rect, "crop applied");
        Ok(())
    }

    /// Bakes freestanding text into the raster through the text-rendering
    /// collaborator. Returns the rect the text landed in. A failed stamp
    /// removes the history entry opened for it and reports the failure.
    pub fn bake_text(
        &mut self,
        stamper: &impl TextStamper,
        request: &StampRequest,
    ) -> EditResult<PixelRect> {
        self.begin_direct_edit("Add text box")?;
        match stamper.stamp(&mut self.working, request) {
            Ok(rect) => {
                self.mark_modified();
                Ok(rect)
            }
            Err(err) => {
                self.history.pop();
                tracing::warn!(error = %err, "text stamp rejected");
                Err(err.into())
            }
        }
    }

    /// Replaces the text of a detected overlay in place, reusing its
    /// captured style, and updates the overlay record with the rect the
    /// replacement actually occupies.
    pub fn replace_overlay_text(
        &mut self,
        stamper: &impl TextStamper,
        index: usize,
        replacement: &str,
        strictness: TextStrictness,
        auto_fit: bool,
        size_scale: f64,
    ) -> EditResult<PixelRect> {
        let len = self.overlays.len();
        if index >= len {
            return Err(EditError::InvalidOverlayIndex { index, len });
        }
        let trimmed = replacement.trim();
        if trimmed.is_empty() {
            return Err(EditError::Stamp(StampError::EmptyText));
        }
        let source = &self.overlays[index];
        let request = StampRequest::new(
            source.bounds,
            trimmed,
            source.style,
            strictness.fit_policy(auto_fit),
        )
        .with_size_scale(size_scale);

        self.push_history("Replace text")?;
        self.invalidate_adjustments();
        match stamper.stamp(&mut self.working, &request) {
            Ok(rect) => {
                let overlay = &mut self.overlays[index];
                overlay.text = trimmed.to_string();
                overlay.bounds = rect;
                self.mark_modified();
                Ok(rect)
            }
            Err(err) => {
                self.history.pop();
                tracing::warn!(error = %err, "text replacement rejected");
                Err(err.into())
            }
        }
    }
}
