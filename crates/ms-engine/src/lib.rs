//! # ms-engine
//!
//! The transcoding engine adapter for mediasmith.
//!
//! This crate provides:
//!
//! - **Engine boundary** ([`Engine`]) -- the narrow black-box interface
//!   (exec, stage, retrieve, remove) the rest of the crate is written
//!   against, so a fake can be injected in tests and the subprocess engine
//!   could be swapped for a native library.
//! - **Loading** ([`EngineLoader`]) -- lazy once-per-session
//!   initialization with a multi-threaded build first and a
//!   single-threaded fallback.
//! - **Subprocess engine** ([`FfmpegEngine`]) -- ffmpeg invocations with a
//!   private staging filesystem and stderr progress parsing.
//! - **Sessions** ([`EngineSession`]) -- single-flight serialization of
//!   the three operations: extract-audio, remove-audio, and
//!   make-animated-image.
//! - **Progress** ([`ProgressProjector`]) -- projection of the raw engine
//!   stream into monotonic integer percentages.

pub mod engine;
pub mod ffmpeg;
pub mod loader;
pub mod ops;
pub mod projector;
pub mod session;
pub mod vfs;

// ---- Re-exports for convenience ----

pub use engine::{Engine, EngineHandle, EngineInfo, ProgressObserver};
pub use ffmpeg::FfmpegEngine;
pub use loader::EngineLoader;
pub use ops::{AnimatedImageOptions, SourceFile};
pub use projector::ProgressProjector;
pub use session::EngineSession;
