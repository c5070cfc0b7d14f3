//! SVG rasterization, background flattening and PNG encoding using resvg.
//!
//! The rasterizer receives an already framed document (see
//! [`Layout::frame`](crate::layout::Layout::frame)) and renders it at the
//! exact canvas size; it does no layout of its own.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{imageops, DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use image::{Pixel, Rgba, RgbaImage};
use palette::Srgb;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::RasterError;
use crate::layout::SizePx;

/// Gaussian sigma of the post-render sharpening pass.
const SHARPEN_SIGMA: f32 = 0.5;

/// Minimum per-channel difference before sharpening kicks in.
const SHARPEN_THRESHOLD: i32 = 1;

// ============================================================================
// Backdrop
// ============================================================================

/// What the rendered artwork is composited onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    /// Keep the alpha channel as rendered.
    Transparent,

    /// Flatten onto a solid, fully opaque fill.
    Opaque(Srgb<u8>),
}

/// An encoded raster and its ground-truth dimensions.
#[derive(Debug, Clone)]
pub struct RasterOutput {
    pub png: Vec<u8>,
    pub size: SizePx,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Renders `svg_data` at `canvas` size, applies the backdrop, sharpens and
/// encodes the result as PNG with maximum compression.
///
/// The returned size is read back from the encoded bytes.
pub fn rasterize(svg_data: &str, canvas: SizePx, backdrop: Backdrop) -> Result<RasterOutput, RasterError> {
    let rendered = render_svg(svg_data, canvas)?;

    let composed = match backdrop {
        Backdrop::Transparent => rendered,
        Backdrop::Opaque(fill) => flatten(&rendered, fill),
    };

    let sharpened = sharpen(&composed);
    let png = match backdrop {
        Backdrop::Transparent => encode_png(&DynamicImage::ImageRgba8(sharpened))?,
        Backdrop::Opaque(_) => encode_png(&DynamicImage::ImageRgba8(sharpened).to_rgb8().into())?,
    };

    let size = png_dimensions(&png)?;
    Ok(RasterOutput { png, size })
}

/// Renders an SVG string to an RGBA image stretched to exactly `canvas`.
pub fn render_svg(svg_data: &str, canvas: SizePx) -> Result<RgbaImage, RasterError> {
    let tree = Tree::from_str(svg_data, &Options::default())
        .map_err(|e| RasterError::Render(e.to_string()))?;

    let mut pixmap = Pixmap::new(canvas.width, canvas.height).ok_or_else(|| {
        RasterError::Render(format!(
            "cannot allocate {}x{} canvas",
            canvas.width, canvas.height
        ))
    })?;

    let svg_size = tree.size();
    let transform = Transform::from_scale(
        canvas.width as f32 / svg_size.width(),
        canvas.height as f32 / svg_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Copies a rendered pixmap into straight-alpha RGBA.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let pixels = pixmap.pixels();

    RgbaImage::from_fn(width, pixmap.height(), |x, y| {
        let color = pixels[(y * width + x) as usize].demultiply();
        Rgba([color.red(), color.green(), color.blue(), color.alpha()])
    })
}

// ============================================================================
// Flattening
// ============================================================================

/// Lays `src` over a solid `fill`. Every output pixel is fully opaque.
pub fn flatten(src: &RgbaImage, fill: Srgb<u8>) -> RgbaImage {
    let (r, g, b) = fill.into_components();

    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let mut pixel = Rgba([r, g, b, 255]);
        pixel.blend(src.get_pixel(x, y));
        pixel
    })
}

// ============================================================================
// Filtering & Encoding
// ============================================================================

/// Applies the fixed unsharp mask that counters vector-to-raster softness.
///
/// Fully transparent pixels stay fully transparent and fully opaque pixels
/// stay fully opaque.
pub fn sharpen(img: &RgbaImage) -> RgbaImage {
    imageops::unsharpen(img, SHARPEN_SIGMA, SHARPEN_THRESHOLD)
}

/// Encodes an image as PNG using the slowest, smallest settings.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RasterError> {
    let mut png = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut png, CompressionType::Best, FilterType::Adaptive);

    let (color, bytes): (ExtendedColorType, &[u8]) = match img {
        DynamicImage::ImageRgb8(rgb) => (ExtendedColorType::Rgb8, rgb.as_raw()),
        DynamicImage::ImageRgba8(rgba) => (ExtendedColorType::Rgba8, rgba.as_raw()),
        other => {
            let rgba = other.to_rgba8();
            return encode_png(&DynamicImage::ImageRgba8(rgba));
        }
    };

    encoder.write_image(bytes, img.width(), img.height(), color)?;
    Ok(png)
}

/// Reads the pixel dimensions from encoded PNG bytes.
pub fn png_dimensions(png: &[u8]) -> Result<SizePx, RasterError> {
    let (width, height) = ImageReader::with_format(Cursor::new(png), ImageFormat::Png).into_dimensions()?;
    Ok(SizePx::new(width, height))
}

// ============================================================================
// Tests
// ============================================================================
