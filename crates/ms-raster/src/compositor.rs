//! Watermark compositing onto a decoded raster.
//!
//! The source image is decoded at its native dimensions, the text stamp is
//! drawn either once (centered, rotated) or as a rotated lattice covering
//! the whole frame, and the result is always re-encoded as lossless PNG at
//! maximum quality so watermark edges stay sharp.
//!
//! Drawing inverse-maps every destination pixel through the rotation about
//! the canvas center into lattice space and samples the stamp there, so
//! any rotation leaves neither holes nor corner gaps.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use ms_core::{Error, OutputArtifact, Result};

use crate::font::WatermarkFont;
use crate::stamp::Stamp;

/// Extra spacing between tiled stamps, horizontally and vertically.
const TILE_GUTTER: f64 = 100.0;

// ---------------------------------------------------------------------------
// WatermarkSpec
// ---------------------------------------------------------------------------

/// One watermark request. Immutable per invocation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSpec {
    /// Text to stamp.
    pub text: String,
    /// Ink opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Font size in pixels.
    pub font_size_px: u32,
    /// Rotation of the stamp (or the whole lattice) in degrees.
    pub rotation_degrees: f64,
    /// One centered stamp, or a repeating lattice covering the frame.
    pub tiled: bool,
    /// Ink color, `#rgb` or `#rrggbb`.
    pub color_hex: String,
}

impl WatermarkSpec {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::Validation("watermark text is empty".into()));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::Validation("opacity must be within 0.0..=1.0".into()));
        }
        if self.font_size_px == 0 {
            return Err(Error::Validation("font_size_px must be positive".into()));
        }
        if !self.rotation_degrees.is_finite() {
            return Err(Error::Validation("rotation_degrees must be finite".into()));
        }
        parse_color_hex(&self.color_hex)?;
        Ok(())
    }
}

/// Parse `#rgb` / `#rrggbb` (leading `#` optional) into RGB bytes.
pub(crate) fn parse_color_hex(hex: &str) -> Result<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let expand = |nibble: u8| nibble << 4 | nibble;

    let parse_nibble = |c: char| -> Result<u8> {
        c.to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| Error::Validation(format!("invalid color: {hex:?}")))
    };

    let chars: Vec<char> = digits.chars().collect();
    match chars.len() {
        3 => Ok([
            expand(parse_nibble(chars[0])?),
            expand(parse_nibble(chars[1])?),
            expand(parse_nibble(chars[2])?),
        ]),
        6 => Ok([
            parse_nibble(chars[0])? << 4 | parse_nibble(chars[1])?,
            parse_nibble(chars[2])? << 4 | parse_nibble(chars[3])?,
            parse_nibble(chars[4])? << 4 | parse_nibble(chars[5])?,
        ]),
        _ => Err(Error::Validation(format!("invalid color: {hex:?}"))),
    }
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// Watermark compositor around one font face.
///
/// Shares no state with the engine path and may run concurrently with it.
#[derive(Debug)]
pub struct Compositor {
    font: WatermarkFont,
}

impl Compositor {
    pub fn new(font: WatermarkFont) -> Self {
        Self { font }
    }

    /// Composite `spec` onto `image_bytes` and return the PNG result.
    pub fn composite(&self, image_bytes: &[u8], spec: &WatermarkSpec) -> Result<OutputArtifact> {
        spec.validate()?;

        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| Error::Decode(format!("unreadable image: {e}")))?;
        let mut canvas = decoded.to_rgba8();

        let stamp = Stamp::from_text(&self.font, &spec.text, spec.font_size_px)?;
        let color = parse_color_hex(&spec.color_hex)?;

        tracing::debug!(
            "watermark {}x{} canvas, stamp {}x{}, tiled={}, rotation={}",
            canvas.width(),
            canvas.height(),
            stamp.width(),
            stamp.height(),
            spec.tiled,
            spec.rotation_degrees
        );

        draw_stamp(
            &mut canvas,
            &stamp,
            color,
            spec.opacity,
            spec.rotation_degrees,
            spec.tiled,
            spec.font_size_px,
        );

        encode_png(&canvas)
    }
}

/// Serialize the canvas as max-quality lossless PNG.
fn encode_png(canvas: &RgbaImage) -> Result<OutputArtifact> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut bytes),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    encoder
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| Error::Surface(format!("PNG encode failed: {e}")))?;

    Ok(OutputArtifact {
        bytes,
        mime_type: "image/png",
        file_extension: "png".to_string(),
    })
}

/// Draw the stamp pattern over the canvas.
///
/// Tiled spacing is stamp width plus a fixed gutter horizontally and
/// `font_size_px * 1.5` plus the gutter vertically; the lattice is
/// unbounded, so after rotation the visible rectangle is covered with no
/// gaps at the corners.
pub(crate) fn draw_stamp(
    canvas: &mut RgbaImage,
    stamp: &Stamp,
    color: [u8; 3],
    opacity: f32,
    rotation_degrees: f64,
    tiled: bool,
    font_size_px: u32,
) {
    let (width, height) = canvas.dimensions();
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let (sin, cos) = rotation_degrees.to_radians().sin_cos();

    let stamp_w = stamp.width() as f64;
    let stamp_h = stamp.height() as f64;
    let spacing_x = stamp_w + TILE_GUTTER;
    let spacing_y = font_size_px as f64 * 1.5 + TILE_GUTTER;

    for y in 0..height {
        for x in 0..width {
            // Inverse-rotate the pixel center into lattice space.
            let dx = x as f64 + 0.5 - center_x;
            let dy = y as f64 + 0.5 - center_y;
            let lattice_x = dx * cos + dy * sin;
            let lattice_y = -dx * sin + dy * cos;

            // One stamp sits centered on the canvas center; tiles repeat
            // from there at the spacing intervals.
            let u = lattice_x + stamp_w / 2.0;
            let v = lattice_y + stamp_h / 2.0;
            let (u, v) = if tiled {
                (u.rem_euclid(spacing_x), v.rem_euclid(spacing_y))
            } else {
                (u, v)
            };

            if u < 0.0 || v < 0.0 || u >= stamp_w || v >= stamp_h {
                continue;
            }
            let coverage = stamp.coverage(u as u32, v as u32);
            if coverage == 0 {
                continue;
            }

            let ink_alpha = opacity as f64 * coverage as f64 / 255.0;
            blend_over(canvas.get_pixel_mut(x, y), color, ink_alpha);
        }
    }
}

/// Standard "over" compositing of ink onto one RGBA pixel.
fn blend_over(pixel: &mut image::Rgba<u8>, color: [u8; 3], ink_alpha: f64) {
    let dst_alpha = pixel[3] as f64 / 255.0;
    let out_alpha = ink_alpha + dst_alpha * (1.0 - ink_alpha);
    if out_alpha <= 0.0 {
        return;
    }
    for c in 0..3 {
        let ink = color[c] as f64;
        let dst = pixel[c] as f64;
        pixel[c] = ((ink * ink_alpha + dst * dst_alpha * (1.0 - ink_alpha)) / out_alpha)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}
