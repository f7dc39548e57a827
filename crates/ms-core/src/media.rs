//! Media-domain types: audio targets, threading modes, container MIME
//! mapping, and the owned output artifact handed back to callers.
//!
//! Enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension assumed for source files whose name carries no usable one.
pub const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

/// Fixed audio bitrate used by the extract-audio operation.
pub const AUDIO_BITRATE: &str = "192k";

// ---------------------------------------------------------------------------
// AudioTarget
// ---------------------------------------------------------------------------

/// Target codec for audio extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTarget {
    Mp3,
    Aac,
}

impl AudioTarget {
    /// The encoder name passed to the engine.
    pub fn codec_name(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Aac => "aac",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Aac => "audio/aac",
        }
    }

    /// File extension of the encoded output.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
        }
    }
}

impl fmt::Display for AudioTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp3 => write!(f, "mp3"),
            Self::Aac => write!(f, "aac"),
        }
    }
}

// ---------------------------------------------------------------------------
// ThreadingMode
// ---------------------------------------------------------------------------

/// Which engine build variant is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadingMode {
    Multi,
    Single,
}

impl fmt::Display for ThreadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multi => write!(f, "multi"),
            Self::Single => write!(f, "single"),
        }
    }
}

// ---------------------------------------------------------------------------
// Container extension handling
// ---------------------------------------------------------------------------

/// Derive the canonical lowercase extension of a source filename.
///
/// Falls back to [`DEFAULT_VIDEO_EXTENSION`] when the name is absent, has no
/// extension, or the extension is not a short alphanumeric token (synthetic
/// staging names must stay predictable).
pub fn canonical_extension(file_name: Option<&str>) -> String {
    let ext = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(stem, ext)| (stem, ext.to_ascii_lowercase()));

    match ext {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => DEFAULT_VIDEO_EXTENSION.to_string(),
    }
}

/// MIME type for a video container, keyed by file extension.
///
/// Unknown extensions fall back to the generic `video/mp4`.
pub fn container_mime_type(extension: &str) -> &'static str {
    match extension {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "ogv" => "video/ogg",
        "ts" => "video/mp2t",
        _ => "video/mp4",
    }
}

// ---------------------------------------------------------------------------
// OutputArtifact
// ---------------------------------------------------------------------------

/// The result of a completed operation.
///
/// `bytes` is a freshly allocated buffer owned by the caller; the core keeps
/// no reference to it and no alias into engine-owned memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// The encoded output.
    pub bytes: Vec<u8>,
    /// MIME type describing `bytes`.
    pub mime_type: &'static str,
    /// Suggested file extension for a download name.
    pub file_extension: String,
}

impl OutputArtifact {
    /// Construct an artifact, copying `bytes` into a fresh allocation.
    ///
    /// The copy is a hard rule: retrieval may hand back a buffer backed by
    /// memory the engine reuses on its next invocation.
    pub fn copied_from(
        bytes: &[u8],
        mime_type: &'static str,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.to_vec(),
            mime_type,
            file_extension: file_extension.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_target_mapping() {
        assert_eq!(AudioTarget::Mp3.codec_name(), "libmp3lame");
        assert_eq!(AudioTarget::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioTarget::Mp3.file_extension(), "mp3");
        assert_eq!(AudioTarget::Aac.codec_name(), "aac");
        assert_eq!(AudioTarget::Aac.mime_type(), "audio/aac");
        assert_eq!(AudioTarget::Aac.file_extension(), "aac");
    }

    #[test]
    fn audio_target_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AudioTarget::Mp3).unwrap(), "\"mp3\"");
        assert_eq!(serde_json::to_string(&AudioTarget::Aac).unwrap(), "\"aac\"");
    }

    #[test]
    fn threading_mode_display() {
        assert_eq!(ThreadingMode::Multi.to_string(), "multi");
        assert_eq!(ThreadingMode::Single.to_string(), "single");
    }

    #[test]
    fn canonical_extension_from_name() {
        assert_eq!(canonical_extension(Some("clip.MOV")), "mov");
        assert_eq!(canonical_extension(Some("a.b.webm")), "webm");
    }

    #[test]
    fn canonical_extension_defaults() {
        assert_eq!(canonical_extension(None), "mp4");
        assert_eq!(canonical_extension(Some("noext")), "mp4");
        assert_eq!(canonical_extension(Some(".hidden")), "mp4");
        assert_eq!(canonical_extension(Some("weird.")), "mp4");
        assert_eq!(canonical_extension(Some("x.not-an-ext!")), "mp4");
        assert_eq!(canonical_extension(Some("x.toolongext")), "mp4");
    }

    #[test]
    fn container_mime_known_and_fallback() {
        assert_eq!(container_mime_type("webm"), "video/webm");
        assert_eq!(container_mime_type("mkv"), "video/x-matroska");
        assert_eq!(container_mime_type("mov"), "video/quicktime");
        assert_eq!(container_mime_type("xyz"), "video/mp4");
    }

    #[test]
    fn artifact_copy_is_fresh_allocation() {
        let source = vec![1u8, 2, 3];
        let artifact = OutputArtifact::copied_from(&source, "audio/mpeg", "mp3");
        assert_eq!(artifact.bytes, source);
        assert_ne!(artifact.bytes.as_ptr(), source.as_ptr());
    }
}
