//! # ms-raster
//!
//! Raster watermarking for mediasmith: decode a source image, overlay one
//! rotated text stamp or a rotated tiled lattice of stamps at a
//! configurable opacity, and serialize the result as lossless PNG.
//!
//! This path never touches the transcoding engine and shares no state with
//! it; a watermark may run concurrently with an engine operation.

pub mod compositor;
pub mod font;
pub mod stamp;

// ---- Re-exports for convenience ----

pub use compositor::{Compositor, WatermarkSpec};
pub use font::WatermarkFont;
pub use stamp::Stamp;
