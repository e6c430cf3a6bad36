#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_drawable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect(self) -> f64 {
        self.width / self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn as_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// A crop rectangle in display (container) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Largest square that fits the container, centered in it.
    pub fn centered_square(container: Size) -> Self {
        let size = container.width.min(container.height).max(0.0);
        Self::new(
            (container.width - size) / 2.0,
            (container.height - size) / 2.0,
            size,
            size,
        )
    }

    /// Shrinks both sides to the shorter one, keeping the origin.
    pub fn squared(self) -> Self {
        let size = self.width.min(self.height).max(0.0);
        Self {
            width: size,
            height: size,
            ..self
        }
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// Layout of an image shown with "contain" fitting inside a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub natural: ImageBounds,
    pub container: Size,
    pub content_width: f64,
    pub content_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl DisplayGeometry {
    /// Returns `None` when either the image or the container has no area.
    pub fn contain(natural: ImageBounds, container: Size) -> Option<Self> {
        if natural.is_empty() || !container.is_drawable() {
            return None;
        }

        let image_aspect = natural.as_size().aspect();
        let (content_width, content_height, offset_x, offset_y) =
            if container.aspect() > image_aspect {
                let content_height = container.height;
                let content_width = content_height * image_aspect;
                (
                    content_width,
                    content_height,
                    (container.width - content_width) / 2.0,
                    0.0,
                )
            } else {
                let content_width = container.width;
                let content_height = content_width / image_aspect;
                (
                    content_width,
                    content_height,
                    0.0,
                    (container.height - content_height) / 2.0,
                )
            };

        Some(Self {
            natural,
            container,
            content_width,
            content_height,
            offset_x,
            offset_y,
        })
    }

    /// Native pixels per displayed pixel along x.
    pub fn scale_x(&self) -> f64 {
        f64::from(self.natural.width) / self.content_width
    }

    /// Native pixels per displayed pixel along y.
    pub fn scale_y(&self) -> f64 {
        f64::from(self.natural.height) / self.content_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
