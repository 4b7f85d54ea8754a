//! Detected and placed text regions, and the seams to the detection and
//! text-rendering collaborators.
//!
//! Overlays are metadata: they live beside the raster and only touch pixels
//! when a replace or bake operation runs through a [`TextStamper`].

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{CanvasPoint, Color, PixelRect};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("text detection backend unavailable: {message}")]
    BackendUnavailable { message: String },
    #[error("text detection failed: {message}")]
    Recognition { message: String },
}

#[derive(Debug, Error)]
pub enum StampError {
    #[error("replacement text is empty")]
    EmptyText,
    #[error("text does not fit the locked region")]
    DoesNotFit,
    #[error("text rendering failed: {message}")]
    Render { message: String },
}

/// Style hints captured at detection time and reused when stamping a
/// replacement, so replaced text blends with its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_px: u32,
    pub weight: u16,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_px: 36,
            weight: 400,
            color: Color::new(17, 24, 39),
        }
    }
}

/// One detected or placed text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub bounds: PixelRect,
    pub text: String,
    pub confidence: f32,
    pub style: TextStyle,
}

impl TextOverlay {
    pub fn new(bounds: PixelRect, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bounds,
            text: text.into(),
            confidence,
            style: TextStyle::default(),
        }
    }
}

/// Hit slack around an overlay box, scaled to the box so small tokens stay
/// clickable without making large ones grabby.
pub fn hit_tolerance(bounds: PixelRect) -> u32 {
    let side = bounds.w.min(bounds.h);
    ((f64::from(side) * 0.22).round() as u32).clamp(3, 14)
}

pub fn overlay_contains(bounds: PixelRect, point: CanvasPoint) -> bool {
    let tolerance = f64::from(hit_tolerance(bounds));
    let left = f64::from(bounds.x) - tolerance;
    let right = f64::from(bounds.right()) + tolerance;
    let top = f64::from(bounds.y) - tolerance;
    let bottom = f64::from(bounds.bottom()) + tolerance;
    point.x >= left && point.x <= right && point.y >= top && point.y <= bottom
}

/// How strictly a replacement must respect the source region's metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStrictness {
    Strict,
    #[default]
    Balanced,
    Loose,
}

impl TextStrictness {
    pub const ALL: [TextStrictness; 3] = [Self::Strict, Self::Balanced, Self::Loose];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Loose => "loose",
        }
    }

    /// Parses a stored preference, falling back to balanced for anything
    /// unrecognized.
    pub fn parse(value: &str) -> Self {
        match value {
            "strict" => Self::Strict,
            "loose" => Self::Loose,
            _ => Self::Balanced,
        }
    }

    /// Resolves the fit flags handed to the stamper. Strict locks the source
    /// box and size; loose frees both; balanced honors the caller's auto-fit
    /// choice and allows width growth.
    pub const fn fit_policy(self, auto_fit_requested: bool) -> FitPolicy {
        match self {
            Self::Strict => FitPolicy {
                auto_fit: false,
                lock_source_size: true,
                expand_width: false,
            },
            Self::Balanced => FitPolicy {
                auto_fit: auto_fit_requested,
                lock_source_size: false,
                expand_width: true,
            },
            Self::Loose => FitPolicy {
                auto_fit: true,
                lock_source_size: false,
                expand_width: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPolicy {
    pub auto_fit: bool,
    pub lock_source_size: bool,
    pub expand_width: bool,
}

/// A single stamp operation handed to the text-rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct StampRequest {
    pub bounds: PixelRect,
    pub text: String,
    pub style: TextStyle,
    pub fit: FitPolicy,
    /// Multiplier on the source font size, clamped to `[0.7, 1.7]`.
    pub size_scale: f64,
}

impl StampRequest {
    pub fn new(bounds: PixelRect, text: impl Into<String>, style: TextStyle, fit: FitPolicy) -> Self {
        Self {
            bounds,
            text: text.into(),
            style,
            fit,
            size_scale: 1.0,
        }
    }

    pub fn with_size_scale(mut self, scale: f64) -> Self {
        self.size_scale = scale.clamp(0.7, 1.7);
        self
    }
}

/// Text detection backend. Implementations run OCR or platform text
/// detection and return overlay records in image coordinates.
pub trait TextDetector {
    fn detect(&self, raster: &RgbaImage) -> Result<Vec<TextOverlay>, DetectError>;
}

/// Text rendering backend. Bakes `request.text` into the raster and returns
/// the rect the rendered text actually occupies.
///
/// Implementations must leave the raster untouched when returning an error;
/// callers rely on that to roll back cleanly.
pub trait TextStamper {
    fn stamp(&self, raster: &mut RgbaImage, request: &StampRequest) -> Result<PixelRect, StampError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_tolerance_scales_with_box_and_stays_bounded() {
        assert_eq!(hit_tolerance(PixelRect::new(0, 0, 10, 8)), 3);
        assert_eq!(hit_tolerance(PixelRect::new(0, 0, 200, 40)), 9);
        assert_eq!(hit_tolerance(PixelRect::new(0, 0, 900, 400)), 14);
    }

    #[test]
    fn overlay_contains_extends_by_tolerance() {
        let bounds = PixelRect::new(50, 50, 40, 40);
        // min side 40 -> tolerance 9
        assert!(overlay_contains(bounds, CanvasPoint::new(42.0, 50.0)));
        assert!(overlay_contains(bounds, CanvasPoint::new(98.0, 98.0)));
        assert!(!overlay_contains(bounds, CanvasPoint::new(40.0, 50.0)));
    }

    #[test]
    fn strictness_parse_defaults_to_balanced() {
        assert_eq!(TextStrictness::parse("strict"), TextStrictness::Strict);
        assert_eq!(TextStrictness::parse("loose"), TextStrictness::Loose);
        assert_eq!(TextStrictness::parse("balanced"), TextStrictness::Balanced);
        assert_eq!(TextStrictness::parse("anything"), TextStrictness::Balanced);
    }

    #[test]
    fn strict_policy_locks_the_source_region() {
        let policy = TextStrictness::Strict.fit_policy(true);
        assert!(!policy.auto_fit);
        assert!(policy.lock_source_size);
        assert!(!policy.expand_width);
    }

    #[test]
    fn balanced_policy_honors_the_auto_fit_request() {
        assert!(TextStrictness::Balanced.fit_policy(true).auto_fit);
        assert!(!TextStrictness::Balanced.fit_policy(false).auto_fit);
        assert!(TextStrictness::Balanced.fit_policy(false).expand_width);
    }

    #[test]
    fn loose_policy_always_auto_fits() {
        let policy = TextStrictness::Loose.fit_policy(false);
        assert!(policy.auto_fit);
        assert!(!policy.lock_source_size);
        assert!(policy.expand_width);
    }

    #[test]
    fn stamp_request_clamps_size_scale() {
        let request = StampRequest::new(
            PixelRect::new(0, 0, 10, 10),
            "hi",
            TextStyle::default(),
            TextStrictness::Balanced.fit_policy(true),
        );
        assert_eq!(request.with_size_scale(9.0).size_scale, 1.7);
    }
}
