//! mediasmith - client-side media processing core
//!
//! The facade crate over the engine adapter ([`ms_engine`]) and the raster
//! watermark compositor ([`ms_raster`]): one [`MediaToolbox`] per session
//! wires lazy engine loading, the three media operations, and
//! watermarking behind a single explicitly passed object.

pub mod toolbox;

pub use toolbox::MediaToolbox;

// Re-export the public surface of the member crates.
pub use ms_core::config::{EngineBuildConfig, EngineConfig};
pub use ms_core::{
    AudioTarget, EngineProgress, Error, OutputArtifact, ProgressSender, ProgressUpdate, Result,
    ThreadingMode,
};
pub use ms_engine::{
    AnimatedImageOptions, Engine, EngineHandle, EngineInfo, EngineLoader, EngineSession,
    FfmpegEngine, ProgressObserver, SourceFile,
};
pub use ms_raster::{Compositor, WatermarkFont, WatermarkSpec};
