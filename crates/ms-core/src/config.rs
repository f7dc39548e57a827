//! Engine configuration.
//!
//! [`EngineConfig`] describes where the two engine build variants come from
//! and how commands are run. Every field defaults sensibly so an empty `{}`
//! is a valid configuration; no environment variables are consulted and
//! nothing is persisted by this crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Name used for `PATH` lookup when no explicit path or fetch URL is set.
pub const DEFAULT_ENGINE_BINARY: &str = "ffmpeg";

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for locating and running the transcoding engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Source of the multi-threaded engine build (tried first).
    pub multi_threaded: EngineBuildConfig,
    /// Source of the single-threaded fallback build.
    pub single_threaded: EngineBuildConfig,
    /// Directory for binaries fetched from a URL. When unset, a session
    /// temporary directory is used, so the fetch happens at most once per
    /// session rather than once per machine.
    pub cache_dir: Option<PathBuf>,
    /// Maximum wall time for one engine command, in seconds.
    ///
    /// Unset means unlimited: timeout policy belongs to the caller.
    pub command_timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            multi_threaded: EngineBuildConfig::default(),
            single_threaded: EngineBuildConfig::default(),
            cache_dir: None,
            command_timeout_secs: None,
        }
    }
}

impl EngineConfig {
    /// Deserialize an `EngineConfig` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the
    /// configuration however it sees fit (bundled, embedded, generated).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// The configured command timeout as a [`Duration`], if any.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (label, build) in [
            ("multi_threaded", &self.multi_threaded),
            ("single_threaded", &self.single_threaded),
        ] {
            if let Some(path) = &build.binary_path {
                if !path.exists() {
                    warnings.push(format!(
                        "{label}.binary_path does not exist: {}",
                        path.display()
                    ));
                }
            }
            if let Some(url) = &build.fetch_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    warnings.push(format!("{label}.fetch_url is not an http(s) URL: {url}"));
                }
            }
        }

        if self.command_timeout_secs == Some(0) {
            warnings.push("command_timeout_secs is 0; every command would time out".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// EngineBuildConfig
// ---------------------------------------------------------------------------

/// Where one engine build variant comes from.
///
/// Resolution order: `binary_path` if it exists, then a previously fetched
/// copy in the cache, then `fetch_url`, then `PATH` lookup of `lookup_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineBuildConfig {
    /// Explicit path to the engine binary.
    pub binary_path: Option<PathBuf>,
    /// Fixed, versioned URL of the engine binary asset.
    pub fetch_url: Option<String>,
    /// Name looked up in `PATH` when nothing else resolves.
    pub lookup_name: String,
}

impl Default for EngineBuildConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            fetch_url: None,
            lookup_name: DEFAULT_ENGINE_BINARY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_valid() {
        let cfg = EngineConfig::from_json("{}").unwrap();
        assert!(cfg.multi_threaded.binary_path.is_none());
        assert_eq!(cfg.multi_threaded.lookup_name, "ffmpeg");
        assert!(cfg.command_timeout().is_none());
    }

    #[test]
    fn parse_error_is_validation() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn timeout_roundtrip() {
        let cfg = EngineConfig::from_json(r#"{"command_timeout_secs": 30}"#).unwrap();
        assert_eq!(cfg.command_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn validate_flags_bad_url_and_missing_path() {
        let cfg = EngineConfig::from_json(
            r#"{
                "multi_threaded": {
                    "binary_path": "/definitely/not/here/engine",
                    "fetch_url": "ftp://example.com/engine"
                }
            }"#,
        )
        .unwrap();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn validate_clean_config() {
        assert!(EngineConfig::default().validate().is_empty());
    }
}
