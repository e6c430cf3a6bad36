use std::io::Cursor;

use image::{imageops, ImageFormat, Rgba, RgbaImage};

use super::transform::PixelRect;
use super::{TransformError, TransformResult};
use crate::geometry::Color;

pub const MAX_SURFACE_SIDE: u32 = 16_384;
const UNIT_PIXEL_RATIO_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub pixel_ratio: f64,
    pub background: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            background: Color::WHITE,
        }
    }
}

/// Draws `rect` of `source` centered on a square canvas filled with the background.
pub fn render_square(
    source: &RgbaImage,
    rect: PixelRect,
    options: RenderOptions,
) -> TransformResult<RgbaImage> {
    let side = surface_side(rect.square_side(), options.pixel_ratio)?;

    let mut content = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
    if (options.pixel_ratio - 1.0).abs() > UNIT_PIXEL_RATIO_EPSILON {
        let width = scaled_extent(rect.width, options.pixel_ratio, side);
        let height = scaled_extent(rect.height, options.pixel_ratio, side);
        content = imageops::resize(&content, width, height, imageops::FilterType::Lanczos3);
    }

    let (r, g, b) = options.background.rgb();
    let mut canvas = RgbaImage::from_pixel(side, side, Rgba([r, g, b, 255]));
    let pad_x = (side - content.width()) / 2;
    let pad_y = (side - content.height()) / 2;
    draw_over(&mut canvas, &content, pad_x, pad_y);
    Ok(canvas)
}

/// Source-over compositing of `top` onto an opaque `canvas`.
fn draw_over(canvas: &mut RgbaImage, top: &RgbaImage, left: u32, upper: u32) {
    for (x, y, pixel) in top.enumerate_pixels() {
        let Some(target) = canvas.get_pixel_mut_checked(left + x, upper + y) else {
            continue;
        };
        let [r, g, b, a] = pixel.0;
        match a {
            0 => {}
            255 => *target = *pixel,
            _ => {
                let alpha = u16::from(a);
                let inverse = 255 - alpha;
                let mix = |fg: u8, bg: u8| {
                    ((u16::from(fg) * alpha + u16::from(bg) * inverse + 127) / 255) as u8
                };
                let [bg_r, bg_g, bg_b, _] = target.0;
                *target = Rgba([mix(r, bg_r), mix(g, bg_g), mix(b, bg_b), 255]);
            }
        }
    }
}

pub fn encode_png(image: &RgbaImage) -> TransformResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(TransformError::Encode)?;
    Ok(bytes.into_inner())
}

fn surface_side(native_side: u32, pixel_ratio: f64) -> TransformResult<u32> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(TransformError::RenderContextUnavailable {
            reason: format!("invalid pixel ratio {pixel_ratio}"),
        });
    }

    let side = (f64::from(native_side) * pixel_ratio).round();
    if side < 1.0 || side > f64::from(MAX_SURFACE_SIDE) {
        return Err(TransformError::RenderContextUnavailable {
            reason: format!("surface side {side} outside 1..={MAX_SURFACE_SIDE}"),
        });
    }
    Ok(side as u32)
}

fn scaled_extent(extent: u32, pixel_ratio: f64, side: u32) -> u32 {
    let scaled = (f64::from(extent) * pixel_ratio).round();
    (scaled as u32).clamp(1, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn full_square_crop_reproduces_source_pixels() {
        let source = gradient(64, 64);
        let output = render_square(&source, PixelRect::new(0, 0, 64, 64), RenderOptions::default())
            .expect("render should succeed");
        assert_eq!(output, source);
    }

    #[test]
    fn non_square_rect_is_centered_with_background_padding() {
        let source = gradient(40, 20);
        let options = RenderOptions {
            pixel_ratio: 1.0,
            background: Color::new(10, 20, 30),
        };
        let output =
            render_square(&source, PixelRect::new(0, 0, 40, 20), options).expect("render should succeed");

        assert_eq!(output.dimensions(), (40, 40));
        assert_eq!(*output.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*output.get_pixel(39, 9), Rgba([10, 20, 30, 255]));
        assert_eq!(*output.get_pixel(5, 10), *source.get_pixel(5, 0));
        assert_eq!(*output.get_pixel(5, 29), *source.get_pixel(5, 19));
        assert_eq!(*output.get_pixel(5, 30), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn pixel_ratio_scales_surface_and_content() {
        let source = gradient(30, 30);
        let options = RenderOptions {
            pixel_ratio: 2.0,
            background: Color::WHITE,
        };
        let output =
            render_square(&source, PixelRect::new(5, 5, 10, 10), options).expect("render should succeed");
        assert_eq!(output.dimensions(), (20, 20));
    }

    #[test]
    fn translucent_pixels_blend_over_background() {
        let source = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128]));
        let output = render_square(&source, PixelRect::new(0, 0, 2, 2), RenderOptions::default())
            .expect("render should succeed");
        assert_eq!(*output.get_pixel(0, 0), Rgba([127, 127, 127, 255]));
    }

    #[test]
    fn oversized_surface_is_unavailable() {
        let err = surface_side(MAX_SURFACE_SIDE, 2.0).expect_err("surface should be too large");
        assert!(matches!(err, TransformError::RenderContextUnavailable { .. }));
    }

    #[test]
    fn invalid_pixel_ratio_is_unavailable() {
        assert!(surface_side(10, 0.0).is_err());
        assert!(surface_side(10, f64::NAN).is_err());
        assert_eq!(surface_side(10, 1.5).expect("valid ratio"), 15);
    }

    #[test]
    fn encode_png_is_lossless() {
        let source = gradient(17, 9);
        let bytes = encode_png(&source).expect("encode should succeed");
        let decoded = image::load_from_memory(&bytes)
            .expect("decode should succeed")
            .to_rgba8();
        assert_eq!(decoded, source);
    }
}
