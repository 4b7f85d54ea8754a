//! Crop ratio presets and the transient pointer-driven crop gesture.
//!
//! A gesture lives from pointer-down to pointer-up: `Idle -> {New, Move,
//! Resize} -> Idle`. Nothing here touches the bitmap; committing hands a
//! pixel rect to the document's crop operation.

use crate::geometry::{
    self, CanvasPoint, CanvasRect, CropHandle, CursorHint, PixelRect,
};

/// Selections smaller than this on either axis are treated as an implicit
/// cancel at commit time.
pub const CROP_MIN_SIZE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropRatio {
    #[default]
    Free,
    Ratio1x1,
    Ratio16x9,
    Ratio9x16,
    Ratio191x100,
    Original,
}

impl CropRatio {
    pub const ALL: [CropRatio; 6] = [
        Self::Free,
        Self::Ratio1x1,
        Self::Ratio16x9,
        Self::Ratio9x16,
        Self::Ratio191x100,
        Self::Original,
    ];

    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Ratio1x1 => "1:1",
            Self::Ratio16x9 => "16:9",
            Self::Ratio9x16 => "9:16",
            Self::Ratio191x100 => "1.91:1",
            Self::Original => "original",
        }
    }

    const fn ratio_pair(self) -> Option<(u32, u32)> {
        match self {
            Self::Free | Self::Original => None,
            Self::Ratio1x1 => Some((1, 1)),
            Self::Ratio16x9 => Some((16, 9)),
            Self::Ratio9x16 => Some((9, 16)),
            Self::Ratio191x100 => Some((191, 100)),
        }
    }

    /// Effective `w/h` ratio for a canvas. `Original` derives the ratio
    /// from the canvas itself; `Free` pins nothing.
    pub fn resolve(self, canvas_w: u32, canvas_h: u32) -> Option<f64> {
        match self {
            Self::Original => Some(f64::from(canvas_w.max(1)) / f64::from(canvas_h.max(1))),
            _ => self
                .ratio_pair()
                .map(|(rw, rh)| f64::from(rw) / f64::from(rh)),
        }
    }

    /// Parses a stored preference label; anything unknown falls back to
    /// free.
    pub fn parse(value: &str) -> Self {
        for ratio in Self::ALL {
            if ratio.label() == value {
                return ratio;
            }
        }
        Self::Free
    }
}

/// Canvas presets for common share targets: a fixed export size plus the
/// crop ratio that matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPreset {
    InstagramPost,
    InstagramStory,
    YoutubeThumb,
    WhatsappStatus,
    WhatsappShare,
}

impl SocialPreset {
    pub const ALL: [SocialPreset; 5] = [
        Self::InstagramPost,
        Self::InstagramStory,
        Self::YoutubeThumb,
        Self::WhatsappStatus,
        Self::WhatsappShare,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::InstagramPost => "instagram-post",
            Self::InstagramStory => "instagram-story",
            Self::YoutubeThumb => "youtube-thumb",
            Self::WhatsappStatus => "whatsapp-status",
            Self::WhatsappShare => "whatsapp-share",
        }
    }

    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::InstagramPost => (1080, 1080),
            Self::InstagramStory | Self::WhatsappStatus => (1080, 1920),
            Self::YoutubeThumb => (1280, 720),
            Self::WhatsappShare => (1200, 628),
        }
    }

    pub const fn crop_ratio(self) -> CropRatio {
        match self {
            Self::InstagramPost => CropRatio::Ratio1x1,
            Self::InstagramStory | Self::WhatsappStatus => CropRatio::Ratio9x16,
            Self::YoutubeThumb => CropRatio::Ratio16x9,
            Self::WhatsappShare => CropRatio::Ratio191x100,
        }
    }
}

/// The largest centered rect of the given ratio that fits the canvas, or
/// the full canvas when no ratio is pinned.
pub fn centered_crop_rect(canvas_w: u32, canvas_h: u32, ratio: Option<f64>) -> CanvasRect {
    let width = f64::from(canvas_w.max(1));
    let height = f64::from(canvas_h.max(1));
    let Some(ratio) = ratio.filter(|r| r.is_finite() && *r > 0.0) else {
        return CanvasRect::new(0.0, 0.0, width, height);
    };
    let mut crop_w = width;
    let mut crop_h = (crop_w / ratio).round();
    if crop_h > height {
        crop_h = height;
        crop_w = (crop_h * ratio).round();
    }
    crop_w = crop_w.clamp(1.0, width);
    crop_h = crop_h.clamp(1.0, height);
    CanvasRect::new(
        ((width - crop_w) / 2.0).round().max(0.0),
        ((height - crop_h) / 2.0).round().max(0.0),
        crop_w,
        crop_h,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CropGesture {
    New { start: CanvasPoint },
    Move { offset_x: f64, offset_y: f64 },
    Resize { handle: CropHandle, start: CanvasRect },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropGestureKind {
    New,
    Move,
    Resize,
}

/// One crop interaction in flight: the pinned ratio, the selection rect,
/// and whatever gesture the pointer is currently driving.
#[derive(Debug, Default)]
pub struct CropSession {
    ratio: CropRatio,
    rect: Option<CanvasRect>,
    gesture: Option<CropGesture>,
}

impl CropSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ratio(&self) -> CropRatio {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: CropRatio) {
        self.ratio = ratio;
    }

    pub fn rect(&self) -> Option<CanvasRect> {
        self.rect
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn has_selection(&self) -> bool {
        self.rect
            .map(geometry::normalize)
            .is_some_and(|r| r.w > 0.0 && r.h > 0.0)
    }

    /// Pins a ratio and seeds the largest centered selection matching it.
    pub fn apply_preset(&mut self, ratio: CropRatio, canvas_w: u32, canvas_h: u32) {
        self.ratio = ratio;
        self.rect = Some(centered_crop_rect(
            canvas_w,
            canvas_h,
            ratio.resolve(canvas_w, canvas_h),
        ));
        self.gesture = None;
    }

    /// Starts a gesture: grabbing a handle resizes, grabbing the interior
    /// moves, anywhere else begins a fresh selection at the point.
    pub fn pointer_down(&mut self, point: CanvasPoint, zoom: f64) -> CropGestureKind {
        if let Some(rect) = self.rect.map(geometry::normalize) {
            let radius = geometry::handle_grab_radius(zoom);
            if let Some(handle) = geometry::handle_at_point(point, rect, radius) {
                self.rect = Some(rect);
                self.gesture = Some(CropGesture::Resize {
                    handle,
                    start: rect,
                });
                return CropGestureKind::Resize;
            }
            if geometry::point_in_rect(point, rect) {
                self.rect = Some(rect);
                self.gesture = Some(CropGesture::Move {
                    offset_x: point.x - rect.x,
                    offset_y: point.y - rect.y,
                });
                return CropGestureKind::Move;
            }
        }
        self.rect = Some(CanvasRect::new(point.x, point.y, 1.0, 1.0));
        self.gesture = Some(CropGesture::New { start: point });
        CropGestureKind::New
    }

    pub fn pointer_move(&mut self, point: CanvasPoint, canvas_w: u32, canvas_h: u32) {
        let ratio = self.ratio.resolve(canvas_w, canvas_h);
        match self.gesture {
            Some(CropGesture::Move { offset_x, offset_y }) => {
                if let Some(rect) = self.rect.map(geometry::normalize) {
                    let max_x = (f64::from(canvas_w) - rect.w).max(0.0);
                    let max_y = (f64::from(canvas_h) - rect.h).max(0.0);
                    self.rect = Some(CanvasRect::new(
                        (point.x - offset_x).clamp(0.0, max_x),
                        (point.y - offset_y).clamp(0.0, max_y),
                        rect.w,
                        rect.h,
                    ));
                }
            }
            Some(CropGesture::Resize { handle, start }) => {
                let next = if let (Some(ratio), Some(anchor)) =
                    (ratio.filter(|_| handle.is_corner()), handle.opposite_corner(start))
                {
                    geometry::build_aspect_rect(anchor.x, anchor.y, point.x, point.y, ratio)
                } else {
                    resize_edges(start, handle, point)
                };
                self.rect = Some(geometry::clamp_to_canvas(next, canvas_w, canvas_h));
            }
            Some(CropGesture::New { start }) => {
                let next = match ratio {
                    Some(ratio) => {
                        geometry::build_aspect_rect(start.x, start.y, point.x, point.y, ratio)
                    }
                    None => CanvasRect::new(
                        start.x.min(point.x),
                        start.y.min(point.y),
                        (point.x - start.x).abs(),
                        (point.y - start.y).abs(),
                    ),
                };
                self.rect = Some(geometry::clamp_to_canvas(next, canvas_w, canvas_h));
            }
            None => {}
        }
    }

    /// Ends the gesture, leaving a normalized, clamped selection behind. A
    /// one-pixel accidental drag still yields a valid (if tiny) rect.
    pub fn pointer_up(&mut self, canvas_w: u32, canvas_h: u32) {
        self.gesture = None;
        self.rect = self
            .rect
            .map(|rect| geometry::clamp_to_canvas(rect, canvas_w, canvas_h));
    }

    /// Discards the selection and any gesture without touching the bitmap.
    pub fn cancel(&mut self) {
        self.rect = None;
        self.gesture = None;
    }

    /// Takes the selection for an explicit crop apply. Selections under the
    /// minimum size dissolve into an implicit cancel (`None`).
    pub fn commit(&mut self, canvas_w: u32, canvas_h: u32) -> Option<PixelRect> {
        let rect = self.rect.take()?;
        self.gesture = None;
        let clamped = geometry::clamp_to_canvas(rect, canvas_w, canvas_h);
        if clamped.w < CROP_MIN_SIZE || clamped.h < CROP_MIN_SIZE {
            tracing::debug!(?clamped, "crop selection below minimum; treating as cancel");
            return None;
        }
        clamped.to_pixel()
    }

    /// What the pointer would do at `point`, for cursor feedback.
    pub fn cursor_hint(&self, point: CanvasPoint, zoom: f64) -> CursorHint {
        if let Some(rect) = self.rect.map(geometry::normalize) {
            let radius = geometry::handle_grab_radius(zoom);
            if let Some(handle) = geometry::handle_at_point(point, rect, radius) {
                return handle.cursor();
            }
            if geometry::point_in_rect(point, rect) {
                return CursorHint::Move;
            }
        }
        CursorHint::Crosshair
    }
}

/// Unconstrained resize: only the edges the handle names follow the
/// pointer, and a collapsing drag pushes the opposing edge to keep the
/// minimum size.
fn resize_edges(start: CanvasRect, handle: CropHandle, point: CanvasPoint) -> CanvasRect {
    let start = geometry::normalize(start);
    let mut left = start.x;
    let mut right = start.x + start.w;
    let mut top = start.y;
    let mut bottom = start.y + start.h;

    if handle.touches_west() {
        left = point.x;
    }
    if handle.touches_east() {
        right = point.x;
    }
    if handle.touches_north() {
        top = point.y;
    }
    if handle.touches_south() {
        bottom = point.y;
    }

    if (right - left).abs() < CROP_MIN_SIZE {
        if handle.touches_west() {
            left = right - CROP_MIN_SIZE;
        } else {
            right = left + CROP_MIN_SIZE;
        }
    }
    if (bottom - top).abs() < CROP_MIN_SIZE {
        if handle.touches_north() {
            top = bottom - CROP_MIN_SIZE;
        } else {
            bottom = top + CROP_MIN_SIZE;
        }
    }

    CanvasRect::new(
        left.min(right),
        top.min(bottom),
        (right - left).abs(),
        (bottom - top).abs(),
    )
}
