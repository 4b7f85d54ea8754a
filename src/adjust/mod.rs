//! Tonal adjustment steps and the pure raster transform that applies them.
//!
//! A step bundles brightness, contrast, and saturation as multiplicative
//! percentages (100 = identity) with a Gaussian blur radius in pixels
//! (0 = identity). Steps are stored normalized; every write path clamps.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::raster;

pub const BRIGHTNESS_MIN: u16 = 40;
pub const BRIGHTNESS_MAX: u16 = 180;
pub const CONTRAST_MIN: u16 = 40;
pub const CONTRAST_MAX: u16 = 200;
pub const SATURATION_MIN: u16 = 0;
pub const SATURATION_MAX: u16 = 220;
pub const BLUR_MAX: u8 = 12;

/// Tile edge for the tonal pass on large rasters. The tonal math is
/// per-pixel, so tile boundaries cannot show in the output; tiling only
/// bounds the working set per pass.
pub const ADJUST_TILE_SIZE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentStep {
    pub brightness: u16,
    pub contrast: u16,
    pub saturation: u16,
    pub blur: u8,
}

impl Default for AdjustmentStep {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl AdjustmentStep {
    pub const NEUTRAL: AdjustmentStep = AdjustmentStep {
        brightness: 100,
        contrast: 100,
        saturation: 100,
        blur: 0,
    };

    /// Builds a step from raw slider values, clamping each into its range.
    pub fn new(brightness: i32, contrast: i32, saturation: i32, blur: i32) -> Self {
        Self {
            brightness: clamp_u16(brightness, BRIGHTNESS_MIN, BRIGHTNESS_MAX),
            contrast: clamp_u16(contrast, CONTRAST_MIN, CONTRAST_MAX),
            saturation: clamp_u16(saturation, SATURATION_MIN, SATURATION_MAX),
            blur: clamp_u16(blur, 0, u16::from(BLUR_MAX)) as u8,
        }
    }

    /// Re-clamps a step that may carry out-of-range values, e.g. one read
    /// back from a persisted session.
    pub fn normalized(self) -> Self {
        Self::new(
            i32::from(self.brightness),
            i32::from(self.contrast),
            i32::from(self.saturation),
            i32::from(self.blur),
        )
    }

    pub fn is_neutral(self) -> bool {
        self.normalized() == Self::NEUTRAL
    }
}

fn clamp_u16(value: i32, min: u16, max: u16) -> u16 {
    value.clamp(i32::from(min), i32::from(max)) as u16
}

/// Applies one step to a raster and returns the filtered copy. Tonal math
/// runs first (tiled on large rasters), the blur pass last over the whole
/// frame.
pub fn apply_step(base: &RgbaImage, step: AdjustmentStep) -> RgbaImage {
    let step = step.normalized();
    let tile = if raster::is_large(base) {
        Some(ADJUST_TILE_SIZE)
    } else {
        None
    };
    let toned = tonal_pass(base, step, tile);
    if step.blur == 0 {
        toned
    } else {
        imageops::blur(&toned, f32::from(step.blur))
    }
}

fn tonal_pass(base: &RgbaImage, step: AdjustmentStep, tile: Option<u32>) -> RgbaImage {
    let lut = build_tone_lut(step);
    let saturation = f64::from(step.saturation) / 100.0;
    let mut out = base.clone();
    let (width, height) = out.dimensions();
    match tile {
        None => tone_region(&mut out, &lut, saturation, 0, 0, width, height),
        Some(size) => {
            let size = size.max(1);
            let mut y = 0;
            while y < height {
                let tile_h = size.min(height - y);
                let mut x = 0;
                while x < width {
                    let tile_w = size.min(width - x);
                    tone_region(&mut out, &lut, saturation, x, y, tile_w, tile_h);
                    x += tile_w;
                }
                y += tile_h;
            }
        }
    }
    out
}

fn tone_region(
    raster: &mut RgbaImage,
    lut: &[u8; 256],
    saturation: f64,
    x0: u32,
    y0: u32,
    w: u32,
    h: u32,
) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let pixel = raster.get_pixel_mut(x, y);
            let r = f64::from(lut[pixel[0] as usize]);
            let g = f64::from(lut[pixel[1] as usize]);
            let b = f64::from(lut[pixel[2] as usize]);
            let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            pixel[0] = clamp_channel(luma + (r - luma) * saturation);
            pixel[1] = clamp_channel(luma + (g - luma) * saturation);
            pixel[2] = clamp_channel(luma + (b - luma) * saturation);
        }
    }
}

fn build_tone_lut(step: AdjustmentStep) -> [u8; 256] {
    let brightness = f64::from(step.brightness) / 100.0;
    let contrast = f64::from(step.contrast) / 100.0;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let brightened = value as f64 * brightness;
        let contrasted = (brightened - 128.0) * contrast + 128.0;
        *slot = clamp_channel(contrasted);
    }
    lut
}

fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                ((x * 7 + y * 3) % 256) as u8,
                ((x * 13 + y * 5) % 256) as u8,
                ((x * 3 + y * 11) % 256) as u8,
                255,
            ])
        })
    }

    #[test]
    fn new_clamps_every_field_into_range() {
        let step = AdjustmentStep::new(500, -20, 1000, 99);
        assert_eq!(step.brightness, BRIGHTNESS_MAX);
        assert_eq!(step.contrast, CONTRAST_MIN);
        assert_eq!(step.saturation, SATURATION_MAX);
        assert_eq!(step.blur, BLUR_MAX);
    }

    #[test]
    fn neutral_detection_survives_out_of_range_noise() {
        assert!(AdjustmentStep::NEUTRAL.is_neutral());
        assert!(!AdjustmentStep::new(120, 100, 100, 0).is_neutral());
        // A persisted step below the brightness floor clamps to 40, which is
        // not neutral.
        let skewed = AdjustmentStep {
            brightness: 10,
            ..AdjustmentStep::NEUTRAL
        };
        assert!(!skewed.is_neutral());
    }

    #[test]
    fn neutral_step_is_the_identity_transform() {
        let base = sample(24, 18);
        assert_eq!(apply_step(&base, AdjustmentStep::NEUTRAL), base);
    }

    #[test]
    fn brightness_scales_channels_multiplicatively() {
        let base = RgbaImage::from_pixel(4, 4, Rgba([100, 50, 200, 255]));
        let out = apply_step(&base, AdjustmentStep::new(120, 100, 100, 0));
        assert_eq!(out.get_pixel(0, 0), &Rgba([120, 60, 240, 255]));
    }

    #[test]
    fn zero_saturation_produces_grayscale() {
        let base = sample(8, 8);
        let out = apply_step(&base, AdjustmentStep::new(100, 100, 0, 0));
        for pixel in out.pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn alpha_is_never_touched() {
        let base = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 99]));
        let out = apply_step(&base, AdjustmentStep::new(180, 200, 220, 0));
        assert!(out.pixels().all(|p| p[3] == 99));
    }

    #[test]
    fn tiled_tonal_pass_matches_untiled_output() {
        let base = sample(37, 29);
        let step = AdjustmentStep::new(130, 160, 60, 0);
        let whole = tonal_pass(&base, step, None);
        // A tile edge far smaller than the raster forces many boundaries.
        let tiled = tonal_pass(&base, step, Some(8));
        assert_eq!(whole, tiled);
    }

    #[test]
    fn blur_changes_pixels_but_not_dimensions() {
        let mut base = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        base.put_pixel(8, 8, Rgba([255, 255, 255, 255]));
        let out = apply_step(&base, AdjustmentStep::new(100, 100, 100, 3));
        assert_eq!(out.dimensions(), (16, 16));
        assert_ne!(out.get_pixel(8, 8), base.get_pixel(8, 8));
        assert_ne!(out.get_pixel(7, 8)[0], 0);
    }
}
