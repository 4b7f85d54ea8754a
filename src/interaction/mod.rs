//! Pointer dispatch for the editing surface.
//!
//! One session per editor view: the active tool, its brush, the crop
//! gesture, and any overlay drag in flight. Every pointer event resolves
//! through a single match on the tool, and each handler reports whether the
//! host should request a repaint.

use crate::config::AppConfig;
use crate::crop::{CropSession, SocialPreset};
use crate::document::{EditResult, ImageDocument};
use crate::geometry::CanvasPoint;
use crate::overlay::TextStrictness;
use crate::raster::{ResizeFit, ResizeMethod};
use crate::tool::{BrushSettings, StrokeRenderer, ToolKind};

const ZOOM_MIN: f64 = 0.05;
const ZOOM_MAX: f64 = 32.0;

#[derive(Debug, Clone, Copy)]
struct OverlayDrag {
    index: usize,
    offset_x: f64,
    offset_y: f64,
    history_recorded: bool,
}

#[derive(Debug)]
pub struct EditorSession {
    tool: ToolKind,
    brush: BrushSettings,
    strictness: TextStrictness,
    crop: CropSession,
    zoom: f64,
    drawing: bool,
    last_point: Option<CanvasPoint>,
    overlay_drag: Option<OverlayDrag>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            tool: ToolKind::Pen,
            brush: BrushSettings::default(),
            strictness: TextStrictness::default(),
            crop: CropSession::new(),
            zoom: 1.0,
            drawing: false,
            last_point: None,
            overlay_drag: None,
        }
    }

    /// Seeds a session from stored preferences.
    pub fn with_config(config: &AppConfig) -> Self {
        let mut session = Self::new();
        session.strictness = config.text_strictness();
        session.crop.set_ratio(config.crop_ratio());
        session
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switches tools. Any crop selection and in-flight gesture is
    /// discarded, and the brush resets to the tool's preset.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        if let Some(preset) = tool.brush_preset() {
            self.brush = preset;
        }
        self.crop.cancel();
        self.drawing = false;
        self.last_point = None;
        self.overlay_drag = None;
        tracing::debug!(tool = tool.label(), "tool selected");
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn set_brush(&mut self, brush: BrushSettings) {
        self.brush = brush;
    }

    pub fn strictness(&self) -> TextStrictness {
        self.strictness
    }

    pub fn set_strictness(&mut self, strictness: TextStrictness) {
        self.strictness = strictness;
    }

    pub fn crop(&self) -> &CropSession {
        &self.crop
    }

    pub fn crop_mut(&mut self) -> &mut CropSession {
        &mut self.crop
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(ZOOM_MIN, ZOOM_MAX)
        } else {
            1.0
        };
    }

    /// Pointer-down dispatch. Returns whether the host should repaint.
    pub fn pointer_down(
        &mut self,
        doc: &mut ImageDocument,
        point: CanvasPoint,
    ) -> EditResult<bool> {
        match self.tool {
            ToolKind::Crop => {
                self.crop.pointer_down(point, self.zoom);
                self.drawing = true;
                self.last_point = Some(point);
                Ok(true)
            }
            tool if tool.is_drawable() => {
                // A press on a detected text box drags it instead of
                // painting over it.
                if let Some(index) = doc.overlay_at_point(point) {
                    doc.select_overlay(index);
                    let bounds = doc.overlays()[index].bounds;
                    self.overlay_drag = Some(OverlayDrag {
                        index,
                        offset_x: point.x - f64::from(bounds.x),
                        offset_y: point.y - f64::from(bounds.y),
                        history_recorded: false,
                    });
                    self.drawing = false;
                    self.last_point = None;
                    return Ok(true);
                }
                doc.begin_brush_gesture(tool)?;
                self.drawing = true;
                self.last_point = Some(point);
                Ok(false)
            }
            ToolKind::Hand => {
                // Panning is viewport state owned by the host.
                self.drawing = false;
                self.last_point = None;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Pointer-move dispatch. Returns whether the host should repaint.
    pub fn pointer_move(
        &mut self,
        doc: &mut ImageDocument,
        renderer: &impl StrokeRenderer,
        point: CanvasPoint,
    ) -> EditResult<bool> {
        if let Some(drag) = &mut self.overlay_drag {
            if !drag.history_recorded {
                doc.push_history("Move text box")?;
                drag.history_recorded = true;
            }
            let x = (point.x - drag.offset_x).round() as i32;
            let y = (point.y - drag.offset_y).round() as i32;
            let index = drag.index;
            doc.move_overlay(index, x, y)?;
            return Ok(true);
        }
        if !self.drawing {
            return Ok(false);
        }
        match self.tool {
            ToolKind::Crop => {
                self.crop.pointer_move(point, doc.width(), doc.height());
                Ok(true)
            }
            tool if tool.is_drawable() => {
                let from = self.last_point.unwrap_or(point);
                doc.apply_stroke_segment(renderer, from, point, tool, &self.brush);
                self.last_point = Some(point);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Pointer-up dispatch. Returns whether the host should repaint.
    pub fn pointer_up(&mut self, doc: &mut ImageDocument) -> EditResult<bool> {
        if self.overlay_drag.take().is_some() {
            self.last_point = None;
            return Ok(true);
        }
        if !self.drawing {
            return Ok(false);
        }
        self.drawing = false;
        self.last_point = None;
        match self.tool {
            ToolKind::Crop => {
                self.crop.pointer_up(doc.width(), doc.height());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Applies the pending crop selection to the document. A degenerate
    /// selection dissolves without touching the bitmap.
    pub fn apply_crop(&mut self, doc: &mut ImageDocument) -> EditResult<bool> {
        match self.crop.commit(doc.width(), doc.height()) {
            Some(rect) => {
                doc.apply_crop(rect)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn cancel_crop(&mut self) {
        self.crop.cancel();
    }

    /// Resizes the canvas to a share preset and pins its crop ratio.
    pub fn apply_social_preset(
        &mut self,
        doc: &mut ImageDocument,
        preset: SocialPreset,
        method: ResizeMethod,
    ) -> EditResult<()> {
        let (width, height) = preset.dimensions();
        doc.resize_to(width, height, method, ResizeFit::Stretch)?;
        self.crop.set_ratio(preset.crop_ratio());
        tracing::debug!(preset = preset.label(), "social preset applied");
        Ok(())
    }
}
