//! Raster plumbing shared by the document model: PNG snapshots, whole-frame
//! geometric operations, and the large-image cutoff.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use thiserror::Error;

use crate::geometry::PixelRect;

/// Pixel count at and above which tiled filtering and the throttled render
/// budget apply.
pub const LARGE_IMAGE_PIXEL_THRESHOLD: u64 = 18_000_000;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("raster encode failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("raster decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("crop rect {0:?} reaches outside a {1}x{2} raster")]
    CropOutOfBounds(PixelRect, u32, u32),
}

pub type RasterResult<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Sampling filter for resizes. Mirrors the quality ladder the editor
/// exposes, from pixel-art nearest up to Lanczos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMethod {
    Lanczos3,
    Triangle,
    Mitchell,
    Pixelated,
}

impl ResizeMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lanczos3 => "lanczos3",
            Self::Triangle => "triangle",
            Self::Mitchell => "mitchell",
            Self::Pixelated => "pixelated",
        }
    }

    const fn filter(self) -> imageops::FilterType {
        match self {
            Self::Lanczos3 => imageops::FilterType::Lanczos3,
            Self::Triangle => imageops::FilterType::Triangle,
            Self::Mitchell => imageops::FilterType::CatmullRom,
            Self::Pixelated => imageops::FilterType::Nearest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFit {
    /// Distort to exactly the target dimensions.
    Stretch,
    /// Preserve the source aspect ratio, letterboxed on transparent pixels.
    Contain,
}

impl ResizeFit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Contain => "contain",
        }
    }
}

pub fn pixel_count(raster: &RgbaImage) -> u64 {
    u64::from(raster.width()) * u64::from(raster.height())
}

pub fn is_large(raster: &RgbaImage) -> bool {
    pixel_count(raster) >= LARGE_IMAGE_PIXEL_THRESHOLD
}

/// Encodes a raster as PNG bytes. Snapshots and the persisted session shape
/// both use this encoding, which keeps content comparison a byte compare.
pub fn encode_png(raster: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(Cursor::new(&mut bytes))
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(RasterError::Encode)?;
    Ok(bytes)
}

pub fn decode_png(bytes: &[u8]) -> RasterResult<RgbaImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|decoded| decoded.into_rgba8())
        .map_err(RasterError::Decode)
}

pub fn crop(raster: &RgbaImage, rect: PixelRect) -> RasterResult<RgbaImage> {
    if rect.w == 0
        || rect.h == 0
        || rect.right() > raster.width()
        || rect.bottom() > raster.height()
    {
        return Err(RasterError::CropOutOfBounds(
            rect,
            raster.width(),
            raster.height(),
        ));
    }
    Ok(imageops::crop_imm(raster, rect.x, rect.y, rect.w, rect.h).to_image())
}

pub fn rotate_quarter(raster: &RgbaImage, direction: RotationDirection) -> RgbaImage {
    match direction {
        RotationDirection::Clockwise => imageops::rotate90(raster),
        RotationDirection::CounterClockwise => imageops::rotate270(raster),
    }
}

pub fn flip(raster: &RgbaImage, axis: FlipAxis) -> RgbaImage {
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(raster),
        FlipAxis::Vertical => imageops::flip_vertical(raster),
    }
}

pub fn resize(
    raster: &RgbaImage,
    target_w: u32,
    target_h: u32,
    method: ResizeMethod,
    fit: ResizeFit,
) -> RgbaImage {
    let target_w = target_w.max(1);
    let target_h = target_h.max(1);
    match fit {
        ResizeFit::Stretch => imageops::resize(raster, target_w, target_h, method.filter()),
        ResizeFit::Contain => {
            let scale_w = f64::from(target_w) / f64::from(raster.width().max(1));
            let scale_h = f64::from(target_h) / f64::from(raster.height().max(1));
            let scale = scale_w.min(scale_h);
            let draw_w = ((f64::from(raster.width()) * scale).round() as u32).max(1);
            let draw_h = ((f64::from(raster.height()) * scale).round() as u32).max(1);
            let scaled = imageops::resize(raster, draw_w, draw_h, method.filter());
            let mut framed = RgbaImage::new(target_w, target_h);
            let dx = i64::from((target_w.saturating_sub(draw_w)) / 2);
            let dy = i64::from((target_h.saturating_sub(draw_h)) / 2);
            imageops::replace(&mut framed, &scaled, dx, dy);
            framed
        }
    }
}
