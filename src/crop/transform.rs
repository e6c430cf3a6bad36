use crate::geometry::{CropRegion, DisplayGeometry, ImageBounds};

/// Crop rectangle in native image pixels, before snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    pub fn square_side(&self) -> f64 {
        self.width.max(self.height)
    }

    /// Rounds to whole pixels and clips to `bounds`.
    ///
    /// Returns `None` when nothing of the rectangle survives.
    pub fn snap(self, bounds: ImageBounds) -> Option<PixelRect> {
        let x = snap_coordinate(self.x, bounds.width);
        let y = snap_coordinate(self.y, bounds.height);
        let width = snap_coordinate(self.width, bounds.width - x);
        let height = snap_coordinate(self.height, bounds.height - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(PixelRect::new(x, y, width, height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn square_side(&self) -> u32 {
        if self.width > self.height {
            self.width
        } else {
            self.height
        }
    }
}

/// Maps a crop drawn over the displayed image into native pixel space.
///
/// The origin is clipped to the visible content and the extent is shrunk to what
/// remains of it, so drags into the letterbox margin never fail.
pub fn map_to_source(geometry: &DisplayGeometry, crop: CropRegion) -> SourceRect {
    let local_x = (crop.x - geometry.offset_x).clamp(0.0, geometry.content_width);
    let local_y = (crop.y - geometry.offset_y).clamp(0.0, geometry.content_height);
    let valid_width = crop.width.min(geometry.content_width - local_x).max(0.0);
    let valid_height = crop.height.min(geometry.content_height - local_y).max(0.0);

    let scale_x = geometry.scale_x();
    let scale_y = geometry.scale_y();
    SourceRect {
        x: local_x * scale_x,
        y: local_y * scale_y,
        width: valid_width * scale_x,
        height: valid_height * scale_y,
    }
}

fn snap_coordinate(value: f64, limit: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    if rounded >= f64::from(limit) {
        limit
    } else {
        rounded as u32
    }
}
