//! Font loading for watermark text.
//!
//! No font ships with the library: callers hand in the bytes of the face
//! they want (the product bundles its own), or [`WatermarkFont::discover`]
//! picks a bold sans face from well-known system locations.

use std::path::Path;

use fontdue::{Font, FontSettings};

use ms_core::{Error, Result};

/// Well-known locations of bold sans faces, checked in order.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// A parsed font face used to rasterize watermark stamps.
pub struct WatermarkFont {
    font: Font,
}

impl WatermarkFont {
    /// Parse a font from raw TTF/OTF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| Error::Decode(format!("unusable font data: {e}")))?;
        Ok(Self { font })
    }

    /// Load a font from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Find a bold sans face in well-known system locations.
    ///
    /// Returns `None` when no candidate exists or none parses; callers
    /// without bundled font bytes can treat that as "watermarking
    /// unavailable".
    pub fn discover() -> Option<Self> {
        for candidate in SYSTEM_FONT_PATHS {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match Self::from_file(path) {
                Ok(font) => {
                    tracing::debug!("watermark font: {candidate}");
                    return Some(font);
                }
                Err(e) => tracing::warn!("skipping font {candidate}: {e}"),
            }
        }
        None
    }

    pub(crate) fn inner(&self) -> &Font {
        &self.font
    }
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkFont").finish_non_exhaustive()
    }
}
