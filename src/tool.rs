//! The closed set of canvas tools and their sticky brush settings.

use image::RgbaImage;

use crate::geometry::{CanvasPoint, Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Pen,
    Highlighter,
    BlurBrush,
    Crop,
    Hand,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        Self::Pen,
        Self::Highlighter,
        Self::BlurBrush,
        Self::Crop,
        Self::Hand,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pen => "Pen",
            Self::Highlighter => "Highlighter",
            Self::BlurBrush => "Blur brush",
            Self::Crop => "Crop",
            Self::Hand => "Pan",
        }
    }

    /// History label for a drawing gesture made with this tool.
    pub const fn gesture_label(self) -> &'static str {
        match self {
            Self::Pen => "Pen stroke",
            Self::Highlighter => "Highlighter stroke",
            Self::BlurBrush => "Blur brush",
            Self::Crop | Self::Hand => "Edit",
        }
    }

    /// Whether pointer drags with this tool mutate raster pixels.
    pub const fn is_drawable(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter | Self::BlurBrush)
    }

    /// Default brush for the tool, if it uses one. Selecting a tool resets
    /// the brush to these values; the user can tune them afterwards.
    pub const fn brush_preset(self) -> Option<BrushSettings> {
        match self {
            Self::Pen => Some(BrushSettings {
                size: 7,
                opacity: 100,
                color: Color::new(96, 165, 250),
            }),
            Self::Highlighter => Some(BrushSettings {
                size: 24,
                opacity: 35,
                color: Color::new(250, 204, 21),
            }),
            Self::BlurBrush => Some(BrushSettings {
                size: 22,
                opacity: 60,
                color: Color::new(96, 165, 250),
            }),
            Self::Crop | Self::Hand => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushSettings {
    /// Brush diameter in image pixels.
    pub size: u32,
    /// Stroke opacity percentage; doubles as blur strength for the blur
    /// brush.
    pub opacity: u8,
    pub color: Color,
}

impl Default for BrushSettings {
    fn default() -> Self {
        match ToolKind::Pen.brush_preset() {
            Some(preset) => preset,
            None => BrushSettings {
                size: 7,
                opacity: 100,
                color: Color::new(96, 165, 250),
            },
        }
    }
}

/// Drawing-tools collaborator. Applies one stroke segment to the raster in
/// place; the engine wraps calls with history capture, adjustment
/// invalidation, and render scheduling.
pub trait StrokeRenderer {
    fn draw_stroke(
        &self,
        raster: &mut RgbaImage,
        from: CanvasPoint,
        to: CanvasPoint,
        tool: ToolKind,
        brush: &BrushSettings,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawable_tools_carry_brush_presets() {
        for tool in ToolKind::ALL {
            assert_eq!(
                tool.brush_preset().is_some(),
                tool.is_drawable(),
                "{tool:?} preset/drawable mismatch"
            );
        }
    }

    #[test]
    fn highlighter_preset_is_wide_and_translucent() {
        let preset = ToolKind::Highlighter
            .brush_preset()
            .expect("highlighter should have a preset");
        assert_eq!(preset.size, 24);
        assert_eq!(preset.opacity, 35);
    }

    #[test]
    fn gesture_labels_name_the_tool() {
        assert_eq!(ToolKind::Pen.gesture_label(), "Pen stroke");
        assert_eq!(ToolKind::BlurBrush.gesture_label(), "Blur brush");
    }
}
