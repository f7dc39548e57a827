//! ms-core: shared types, errors, progress, and configuration.
//!
//! This crate is the foundational dependency for the other ms-* crates,
//! providing a unified error type, media-domain enums and MIME mapping,
//! progress reporting primitives, and engine configuration.

pub mod config;
pub mod error;
pub mod media;
pub mod progress;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use media::*;
pub use progress::{EngineProgress, ProgressSender, ProgressUpdate};
