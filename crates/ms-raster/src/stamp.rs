//! Text stamp rasterization.
//!
//! A [`Stamp`] is the coverage mask of one rendered piece of watermark
//! text. Color and opacity are applied later at composite time, so the
//! stamp itself stores one alpha byte per pixel.

use ms_core::{Error, Result};

use crate::font::WatermarkFont;

/// A rasterized watermark tile: per-pixel glyph coverage.
pub struct Stamp {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Stamp {
    /// Rasterize `text` at `font_size_px`.
    ///
    /// Glyphs are measured first to size the tile, then blitted at a
    /// shared baseline.
    pub fn from_text(font: &WatermarkFont, text: &str, font_size_px: u32) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Validation("watermark text is empty".into()));
        }
        let font = font.inner();
        let px = font_size_px as f32;

        // Measure.
        let mut total_width: i32 = 0;
        let mut max_ascent: i32 = 0;
        let mut max_descent: i32 = 0;
        for ch in text.chars() {
            let metrics = font.metrics(ch, px);
            let ascent = metrics.height as i32 + metrics.ymin;
            let descent = -metrics.ymin;
            max_ascent = max_ascent.max(ascent);
            max_descent = max_descent.max(descent);
            total_width += metrics.advance_width.round() as i32;
        }

        let width = total_width.max(1) as u32;
        let height = (max_ascent + max_descent).max(1) as u32;
        let mut data = vec![0u8; (width * height) as usize];

        // Render.
        let mut cursor_x: i32 = 0;
        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, px);
            let glyph_x = cursor_x + metrics.xmin;
            let glyph_y = max_ascent - (metrics.height as i32 + metrics.ymin);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let value = bitmap[gy * metrics.width + gx];
                    if value == 0 {
                        continue;
                    }
                    let x = glyph_x + gx as i32;
                    let y = glyph_y + gy as i32;
                    if x >= 0 && (x as u32) < width && y >= 0 && (y as u32) < height {
                        let idx = (y as u32 * width + x as u32) as usize;
                        data[idx] = data[idx].max(value);
                    }
                }
            }
            cursor_x += metrics.advance_width.round() as i32;
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A uniformly opaque stamp. Lets geometry be exercised without any
    /// font face, and stands in for non-text marks.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            data: vec![255; (width.max(1) * height.max(1)) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Glyph coverage at a tile position, 0 outside the tile.
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Whether any pixel carries ink.
    pub fn has_ink(&self) -> bool {
        self.data.iter().any(|&c| c > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_stamp_covers_everything() {
        let stamp = Stamp::solid(4, 2);
        assert_eq!(stamp.width(), 4);
        assert_eq!(stamp.height(), 2);
        assert_eq!(stamp.coverage(0, 0), 255);
        assert_eq!(stamp.coverage(3, 1), 255);
        assert_eq!(stamp.coverage(4, 0), 0);
        assert!(stamp.has_ink());
    }

    #[test]
    fn solid_stamp_never_degenerates() {
        let stamp = Stamp::solid(0, 0);
        assert_eq!(stamp.width(), 1);
        assert_eq!(stamp.height(), 1);
    }

    #[test]
    fn empty_text_is_rejected() {
        let Some(font) = WatermarkFont::discover() else {
            return;
        };
        assert!(Stamp::from_text(&font, "   ", 24).is_err());
    }

    #[test]
    fn rendered_text_has_ink_and_plausible_bounds() {
        let Some(font) = WatermarkFont::discover() else {
            return;
        };
        let stamp = Stamp::from_text(&font, "© mediasmith", 32).unwrap();
        assert!(stamp.has_ink());
        // Taller glyph runs stay in the neighborhood of the font size.
        assert!(stamp.height() >= 16 && stamp.height() <= 64);
        assert!(stamp.width() > stamp.height());
    }
}
