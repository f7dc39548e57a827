//! Unified error type for the mediasmith core.
//!
//! All crates funnel their failures into [`Error`], which is returned as a
//! typed value across the public boundary. Nothing is retried internally;
//! the caller decides whether to re-run a failed operation from the start.

/// Unified error type covering all failure modes in the media core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Both engine builds failed to initialize.
    ///
    /// The multi-threaded build is attempted first; the single-threaded
    /// build is the fallback. Both causes are retained so callers can tell
    /// a missing binary apart from a broken one.
    #[error("engine failed to load (multi-threaded: {multi_threaded}; single-threaded: {single_threaded})")]
    Load {
        /// Why the multi-threaded build failed to initialize.
        multi_threaded: String,
        /// Why the single-threaded fallback failed to initialize.
        single_threaded: String,
    },

    /// An operation was attempted before the engine loaded successfully.
    #[error("engine is not loaded")]
    EngineNotLoaded,

    /// The engine invocation exited non-zero or could not be run.
    #[error("transcode failed [{operation}]: {message}")]
    Transcode {
        /// The operation that was running (e.g. "extract-audio").
        operation: String,
        /// Human-readable error description, including engine stderr.
        message: String,
    },

    /// Staging, retrieval, or another filesystem operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Fetching an engine binary from its configured location failed.
    #[error("engine fetch failed [{url}]: {message}")]
    Fetch {
        /// The URL that was being fetched.
        url: String,
        /// Human-readable error description.
        message: String,
    },

    /// The watermark source image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The raster surface could not be drawn or serialized.
    #[error("surface error: {0}")]
    Surface(String),

    /// Request options failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transcode {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Fetch`].
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Load`].
    pub fn load(multi_threaded: impl Into<String>, single_threaded: impl Into<String>) -> Self {
        Error::Load {
            multi_threaded: multi_threaded.into(),
            single_threaded: single_threaded.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
