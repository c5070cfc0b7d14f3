//! Padding-aware layout of artwork inside a raster canvas.
//!
//! The requested width is always the final canvas width. Padding is taken
//! out of the artwork, never added to the canvas, and the canvas height
//! follows from the artwork's aspect ratio.
//!
//! All rounding uses [`f64::round`], i.e. half away from zero.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ValidationError;

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Inner (artwork) and outer (canvas) dimensions for one rendition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Margin on each horizontal side, in pixels (unrounded).
    pub padding: f64,
    pub inner: SizePx,
    pub outer: SizePx,
}

impl Layout {
    /// Computes the layout for `target_width` with `padding_fraction` of the
    /// width reserved on each side, for artwork of `aspect_ratio` (h / w).
    pub fn compute(
        target_width: u32,
        padding_fraction: f64,
        aspect_ratio: f64,
    ) -> Result<Self, ValidationError> {
        check_width(target_width)?;
        check_padding(padding_fraction)?;
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(ValidationError::AspectRatio(aspect_ratio));
        }

        let width = f64::from(target_width);
        let padding = width * padding_fraction;
        let inner_width = (width - 2.0 * padding).round();
        let inner_height = (inner_width * aspect_ratio).round();
        let outer_height = (inner_height + 2.0 * padding).round();

        if inner_width < 1.0 || inner_height < 1.0 {
            return Err(ValidationError::Collapsed {
                target: target_width,
                width: inner_width as i64,
                height: inner_height as i64,
            });
        }

        let pixels = |value: f64| {
            u32::try_from(value as i64).map_err(|_| ValidationError::Oversized {
                target: target_width,
                height: value,
            })
        };

        Ok(Self {
            padding,
            inner: SizePx::new(inner_width as u32, pixels(inner_height)?),
            outer: SizePx::new(target_width, pixels(outer_height)?),
        })
    }

    /// Top-left corner of the artwork box, centered on the canvas.
    pub fn offset(&self) -> (f64, f64) {
        (
            (f64::from(self.outer.width) - f64::from(self.inner.width)) / 2.0,
            (f64::from(self.outer.height) - f64::from(self.inner.height)) / 2.0,
        )
    }

    /// Wraps `vector` in a canvas-sized SVG that places it, as inline data,
    /// inside the centered artwork box.
    ///
    /// The result is self-contained: rendering it needs no file access.
    pub fn frame(&self, vector: &str) -> String {
        let (x, y) = self.offset();
        let data = STANDARD.encode(vector.as_bytes());
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
                r#"width="{ow}" height="{oh}" viewBox="0 0 {ow} {oh}">"#,
                r#"<image x="{x}" y="{y}" width="{iw}" height="{ih}" "#,
                r#"xlink:href="data:image/svg+xml;base64,{data}"/>"#,
                "</svg>"
            ),
            ow = self.outer.width,
            oh = self.outer.height,
            x = x,
            y = y,
            iw = self.inner.width,
            ih = self.inner.height,
            data = data,
        )
    }
}

/// Rejects widths that cannot produce a canvas.
pub fn check_width(width: u32) -> Result<(), ValidationError> {
    if width == 0 {
        return Err(ValidationError::ZeroWidth);
    }
    Ok(())
}

/// Rejects padding fractions outside `[0, 0.5)`.
pub fn check_padding(padding_fraction: f64) -> Result<(), ValidationError> {
    if !(padding_fraction.is_finite() && (0.0..0.5).contains(&padding_fraction)) {
        return Err(ValidationError::Padding(padding_fraction));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_aspect_with_ten_percent_padding() {
        let layout = Layout::compute(200, 0.1, 0.5).unwrap();

        assert_eq!(layout.padding, 20.0);
        assert_eq!(layout.inner, SizePx::new(160, 80));
        assert_eq!(layout.outer, SizePx::new(200, 120));
        assert_eq!(layout.offset(), (20.0, 20.0));
    }

    #[test]
    fn no_padding_fills_canvas() {
        let layout = Layout::compute(64, 0.0, 1.0).unwrap();
        assert_eq!(layout.inner, SizePx::new(64, 64));
        assert_eq!(layout.outer, SizePx::new(64, 64));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // padding = 4.8, inner = round(22.4) = 22, outer = round(22 + 9.6) = 32
        let layout = Layout::compute(32, 0.15, 1.0).unwrap();
        assert_eq!(layout.inner, SizePx::new(22, 22));
        assert_eq!(layout.outer, SizePx::new(32, 32));

        // inner height = round(2.5) = 3
        let layout = Layout::compute(5, 0.0, 0.5).unwrap();
        assert_eq!(layout.inner, SizePx::new(5, 3));
    }

    #[test]
    fn output_width_is_always_requested_width() {
        for width in [7u32, 125, 250, 333, 2000] {
            let layout = Layout::compute(width, 0.1, 0.37).unwrap_or_else(|e| panic!("{width}: {e}"));
            assert_eq!(layout.outer.width, width);
        }
    }

    #[test]
    fn aspect_ratio_is_preserved_within_rounding() {
        for width in [32u32, 64, 125, 500, 2000] {
            for ratio in [0.25, 0.5, 0.618, 1.0, 1.75] {
                let layout = Layout::compute(width, 0.1, ratio).unwrap();
                let expected = f64::from(layout.inner.width) * ratio;
                assert!(
                    (f64::from(layout.inner.height) - expected).abs() <= 1.0,
                    "{width} @ {ratio}: {layout:?}"
                );
            }
        }
    }

    #[test]
    fn rejects_padding_at_or_above_half() {
        assert_eq!(
            Layout::compute(100, 0.5, 1.0),
            Err(ValidationError::Padding(0.5))
        );
        assert!(Layout::compute(100, 0.75, 1.0).is_err());
        assert!(Layout::compute(100, -0.1, 1.0).is_err());
        assert!(Layout::compute(100, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn rejects_zero_width_and_bad_ratio() {
        assert_eq!(Layout::compute(0, 0.1, 1.0), Err(ValidationError::ZeroWidth));
        assert!(matches!(
            Layout::compute(100, 0.1, 0.0),
            Err(ValidationError::AspectRatio(_))
        ));
    }

    #[test]
    fn rejects_collapsed_artwork() {
        assert!(matches!(
            Layout::compute(1, 0.4, 1.0),
            Err(ValidationError::Collapsed { target: 1, .. })
        ));
    }

    #[test]
    fn rejects_height_beyond_pixel_range() {
        assert!(matches!(
            Layout::compute(100_000, 0.0, 1e6),
            Err(ValidationError::Oversized { target: 100_000, .. })
        ));
        assert!(Layout::compute(u32::MAX, 0.0, 1.0).is_ok());
    }

    #[test]
    fn frame_embeds_vector_as_inline_data() {
        let layout = Layout::compute(200, 0.1, 0.5).unwrap();
        let framed = layout.frame("<svg/>");

        assert!(framed.contains(r#"width="200" height="120""#));
        assert!(framed.contains(r#"x="20" y="20" width="160" height="80""#));
        assert!(framed.contains(&format!("base64,{}", STANDARD.encode("<svg/>"))));
    }
}
