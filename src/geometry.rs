//! Shared geometric and color primitives used across the document and
//! interaction modules, plus the pure rectangle math behind crop gestures.
//!
//! Everything here is total: degenerate input produces a defined result,
//! never a panic.

use serde::{Deserialize, Serialize};

/// A pointer position in image-pixel coordinates. Pointer events arrive with
/// subpixel precision, so the canvas-space types are `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in canvas space. Width and height may be
/// negative while a drag is in flight; [`normalize`] produces the
/// equivalent non-negative form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CanvasRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The eight compass handles of the normalized rect, corners plus edge
    /// midpoints.
    pub fn handle_positions(&self) -> [(CropHandle, CanvasPoint); 8] {
        let r = normalize(*self);
        let cx = r.x + r.w / 2.0;
        let cy = r.y + r.h / 2.0;
        [
            (CropHandle::NorthWest, CanvasPoint::new(r.x, r.y)),
            (CropHandle::North, CanvasPoint::new(cx, r.y)),
            (CropHandle::NorthEast, CanvasPoint::new(r.x + r.w, r.y)),
            (CropHandle::West, CanvasPoint::new(r.x, cy)),
            (CropHandle::East, CanvasPoint::new(r.x + r.w, cy)),
            (CropHandle::SouthWest, CanvasPoint::new(r.x, r.y + r.h)),
            (CropHandle::South, CanvasPoint::new(cx, r.y + r.h)),
            (CropHandle::SouthEast, CanvasPoint::new(r.x + r.w, r.y + r.h)),
        ]
    }

    /// Rounds to whole pixels. Returns `None` when the normalized rect would
    /// round below one pixel on either axis or sits outside the first
    /// quadrant.
    pub fn to_pixel(&self) -> Option<PixelRect> {
        let r = normalize(*self);
        if !(r.x.is_finite() && r.y.is_finite() && r.w.is_finite() && r.h.is_finite()) {
            return None;
        }
        let x = r.x.round();
        let y = r.y.round();
        let w = r.w.round();
        let h = r.h.round();
        if x < 0.0 || y < 0.0 || w < 1.0 || h < 1.0 {
            return None;
        }
        Some(PixelRect::new(x as u32, y as u32, w as u32, h as u32))
    }
}

/// A whole-pixel rectangle, used for committed crops and text overlay
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn center(&self) -> CanvasPoint {
        CanvasPoint::new(
            f64::from(self.x) + f64::from(self.w) / 2.0,
            f64::from(self.y) + f64::from(self.h) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

/// One of the eight drag points on a crop rectangle's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropHandle {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

/// Pointer shape the host should show for a given hover target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    ResizeNwSe,
    ResizeNeSw,
    ResizeNs,
    ResizeEw,
    Move,
    Crosshair,
}

impl CropHandle {
    pub const ALL: [CropHandle; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::West,
        Self::East,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
    ];

    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Self::NorthWest | Self::NorthEast | Self::SouthWest | Self::SouthEast
        )
    }

    pub const fn touches_west(self) -> bool {
        matches!(self, Self::NorthWest | Self::West | Self::SouthWest)
    }

    pub const fn touches_east(self) -> bool {
        matches!(self, Self::NorthEast | Self::East | Self::SouthEast)
    }

    pub const fn touches_north(self) -> bool {
        matches!(self, Self::NorthWest | Self::North | Self::NorthEast)
    }

    pub const fn touches_south(self) -> bool {
        matches!(self, Self::SouthWest | Self::South | Self::SouthEast)
    }

    pub const fn cursor(self) -> CursorHint {
        match self {
            Self::NorthWest | Self::SouthEast => CursorHint::ResizeNwSe,
            Self::NorthEast | Self::SouthWest => CursorHint::ResizeNeSw,
            Self::North | Self::South => CursorHint::ResizeNs,
            Self::West | Self::East => CursorHint::ResizeEw,
        }
    }

    /// The corner of `rect` diagonally opposite this handle. Edge handles
    /// have no opposite corner.
    pub fn opposite_corner(self, rect: CanvasRect) -> Option<CanvasPoint> {
        let r = normalize(rect);
        match self {
            Self::NorthWest => Some(CanvasPoint::new(r.x + r.w, r.y + r.h)),
            Self::NorthEast => Some(CanvasPoint::new(r.x, r.y + r.h)),
            Self::SouthWest => Some(CanvasPoint::new(r.x + r.w, r.y)),
            Self::SouthEast => Some(CanvasPoint::new(r.x, r.y)),
            _ => None,
        }
    }
}

const HANDLE_RADIUS_MIN: f64 = 10.0;
const HANDLE_RADIUS_MAX: f64 = 22.0;
const HANDLE_RADIUS_BASE: f64 = 18.0;
const ASPECT_EPSILON: f64 = 0.0001;

/// Returns the equivalent rect with non-negative width and height, so a
/// drag in any direction yields the same rectangle.
pub fn normalize(rect: CanvasRect) -> CanvasRect {
    CanvasRect {
        x: rect.x.min(rect.x + rect.w),
        y: rect.y.min(rect.y + rect.h),
        w: rect.w.abs(),
        h: rect.h.abs(),
    }
}

/// Clips the origin into the canvas and clamps the size so the rect never
/// reaches past the canvas edge. For any input with `w >= 1` and `h >= 1`
/// the output keeps both dimensions at least one pixel.
pub fn clamp_to_canvas(rect: CanvasRect, canvas_w: u32, canvas_h: u32) -> CanvasRect {
    let r = normalize(rect);
    let canvas_w = f64::from(canvas_w);
    let canvas_h = f64::from(canvas_h);
    let x = r.x.clamp(0.0, (canvas_w - 1.0).max(0.0));
    let y = r.y.clamp(0.0, (canvas_h - 1.0).max(0.0));
    let max_w = (canvas_w - x).max(1.0);
    let max_h = (canvas_h - y).max(1.0);
    CanvasRect {
        x,
        y,
        w: r.w.clamp(1.0, max_w),
        h: r.h.clamp(1.0, max_h),
    }
}

fn nudge_from_zero(delta: f64) -> f64 {
    if delta.abs() >= ASPECT_EPSILON {
        delta
    } else if delta >= 0.0 {
        ASPECT_EPSILON
    } else {
        -ASPECT_EPSILON
    }
}

fn apply_aspect_to_delta(dx: f64, dy: f64, ratio: f64) -> (f64, f64) {
    if !ratio.is_finite() || ratio <= 0.0 {
        return (dx, dy);
    }
    let safe_dx = nudge_from_zero(dx);
    let safe_dy = nudge_from_zero(dy);
    if safe_dx.abs() / safe_dy.abs() > ratio {
        (safe_dx, safe_dy.signum() * (safe_dx.abs() / ratio))
    } else {
        (safe_dx.signum() * (safe_dy.abs() * ratio), safe_dy)
    }
}

/// Builds the largest `w/h == ratio` rectangle anchored at one corner and
/// passing through the dominant axis of the drag, so a diagonal drag never
/// produces an inconsistent rect. Zero deltas are nudged by an epsilon to
/// keep the construction total.
pub fn build_aspect_rect(
    anchor_x: f64,
    anchor_y: f64,
    point_x: f64,
    point_y: f64,
    ratio: f64,
) -> CanvasRect {
    let (dx, dy) = apply_aspect_to_delta(point_x - anchor_x, point_y - anchor_y, ratio);
    CanvasRect {
        x: anchor_x.min(anchor_x + dx),
        y: anchor_y.min(anchor_y + dy),
        w: dx.abs(),
        h: dy.abs(),
    }
}

/// Grab radius for crop handles. Scales inversely with zoom so handles stay
/// easy to hit when zoomed in, bounded to `[10, 22]` canvas pixels.
pub fn handle_grab_radius(zoom: f64) -> f64 {
    (HANDLE_RADIUS_BASE / zoom.max(0.7)).clamp(HANDLE_RADIUS_MIN, HANDLE_RADIUS_MAX)
}

/// The nearest handle of `rect` within `radius` of `point`, if any.
pub fn handle_at_point(point: CanvasPoint, rect: CanvasRect, radius: f64) -> Option<CropHandle> {
    let mut best: Option<(CropHandle, f64)> = None;
    for (handle, pos) in rect.handle_positions() {
        let distance = (point.x - pos.x).hypot(point.y - pos.y);
        if distance <= radius && best.map_or(true, |(_, d)| distance < d) {
            best = Some((handle, distance));
        }
    }
    best.map(|(handle, _)| handle)
}

/// Inclusive containment test on the normalized rect.
pub fn point_in_rect(point: CanvasPoint, rect: CanvasRect) -> bool {
    let r = normalize(rect);
    point.x >= r.x && point.x <= r.x + r.w && point.y >= r.y && point.y <= r.y + r.h
}
