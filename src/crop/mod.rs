//! Square crop pipeline: display-space selection to native pixels to padded square output.

pub mod render;
pub mod session;
pub mod transform;

use image::RgbaImage;
use thiserror::Error;

use crate::geometry::{DisplayGeometry, ImageBounds, Size};

pub use render::{encode_png, render_square, RenderOptions, MAX_SURFACE_SIDE};
pub use session::{
    CompletedCrop, CropEvent, CropSession, CropSessionError, CropSessionResult, CropState,
    CropTransition,
};
pub use transform::{map_to_source, PixelRect, SourceRect};

pub type TransformResult<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("could not create drawing surface: {reason}")]
    RenderContextUnavailable { reason: String },
    #[error("no active crop to apply")]
    NoActiveCrop,
    #[error("crop region does not cover any image pixels")]
    EmptyRegion,
    #[error("could not encode cropped image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Runs the full pipeline for an image shown in `container` with contain fitting.
pub fn crop_to_square(
    source: &RgbaImage,
    container: Size,
    crop: CompletedCrop,
    options: RenderOptions,
) -> TransformResult<RgbaImage> {
    let bounds = ImageBounds::new(source.width(), source.height());
    let geometry = DisplayGeometry::contain(bounds, container).ok_or_else(|| {
        TransformError::RenderContextUnavailable {
            reason: format!(
                "cannot lay out {}x{} image in {}x{} container",
                bounds.width, bounds.height, container.width, container.height
            ),
        }
    })?;

    let source_rect = map_to_source(&geometry, crop.region());
    let pixels = source_rect.snap(bounds).ok_or(TransformError::EmptyRegion)?;
    tracing::debug!(
        ?source_rect,
        ?pixels,
        pixel_ratio = options.pixel_ratio,
        "mapped crop region to source pixels"
    );
    render_square(source, pixels, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CropRegion;
    use image::Rgba;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let shade = if (x / 4 + y / 4) % 2 == 0 { 230 } else { 25 };
            Rgba([shade, (x % 256) as u8, (y % 256) as u8, 255])
        })
    }

    #[test]
    fn cropping_full_visible_content_of_square_image_is_identity() {
        let source = checker(64, 64);
        let container = Size::new(200.0, 100.0);
        let crop = CompletedCrop::new(CropRegion::new(50.0, 0.0, 100.0, 100.0));

        let output = crop_to_square(&source, container, crop, RenderOptions::default())
            .expect("crop should succeed");
        assert_eq!(output, source);
    }

    #[test]
    fn letterboxed_crop_stays_inside_source_and_pads_to_square() {
        let source = checker(1000, 500);
        let container = Size::new(500.0, 500.0);
        let crop = CompletedCrop::new(CropRegion::new(0.0, 100.0, 500.0, 500.0));

        let output = crop_to_square(&source, container, crop, RenderOptions::default())
            .expect("crop should succeed");
        assert_eq!(output.dimensions(), (1000, 1000));
        assert_eq!(*output.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*output.get_pixel(0, 250), *source.get_pixel(0, 0));
        assert_eq!(*output.get_pixel(999, 749), *source.get_pixel(999, 499));
        assert_eq!(*output.get_pixel(0, 750), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn crop_larger_than_content_on_both_axes_keeps_whole_image() {
        let source = checker(1000, 500);
        let container = Size::new(500.0, 500.0);
        let crop = CompletedCrop::new(CropRegion::new(-30.0, 60.0, 700.0, 700.0));

        let output = crop_to_square(&source, container, crop, RenderOptions::default())
            .expect("crop should succeed");
        assert_eq!(output.dimensions(), (1000, 1000));
        assert_eq!(*output.get_pixel(0, 250), *source.get_pixel(0, 0));
        assert_eq!(*output.get_pixel(999, 749), *source.get_pixel(999, 499));
        assert_eq!(*output.get_pixel(500, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn every_valid_crop_produces_square_output() {
        let source = checker(300, 180);
        let container = Size::new(320.0, 240.0);
        let regions = [
            CropRegion::new(0.0, 0.0, 240.0, 240.0),
            CropRegion::new(10.0, 30.0, 75.0, 75.0),
            CropRegion::new(250.0, 150.0, 200.0, 200.0),
            CropRegion::new(-40.0, -40.0, 120.0, 120.0),
            CropRegion::new(33.3, 47.7, 61.9, 61.9),
        ];

        for region in regions {
            let output = crop_to_square(
                &source,
                container,
                CompletedCrop::new(region),
                RenderOptions::default(),
            )
            .expect("crop should succeed");
            assert_eq!(output.width(), output.height(), "region {region:?}");
        }
    }

    #[test]
    fn crop_entirely_in_margin_is_empty_region() {
        let source = checker(1000, 500);
        let crop = CompletedCrop::new(CropRegion::new(0.0, 400.0, 50.0, 50.0));
        let err = crop_to_square(&source, Size::new(500.0, 500.0), crop, RenderOptions::default())
            .expect_err("margin-only crop should fail");
        assert!(matches!(err, TransformError::EmptyRegion));
    }

    #[test]
    fn zero_sized_container_has_no_render_context() {
        let source = checker(10, 10);
        let crop = CompletedCrop::new(CropRegion::new(0.0, 0.0, 5.0, 5.0));
        let err = crop_to_square(&source, Size::new(0.0, 10.0), crop, RenderOptions::default())
            .expect_err("degenerate container should fail");
        assert!(matches!(err, TransformError::RenderContextUnavailable { .. }));
    }
}
