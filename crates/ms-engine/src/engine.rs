//! The [`Engine`] trait: the narrow adapter boundary to the transcoding
//! engine.
//!
//! Everything the operations need from the engine goes through this trait:
//! command execution, the private file namespace, and identity. Tests inject
//! a fake, and a native transcoding library could replace the subprocess
//! engine without touching the operation executor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use ms_core::{EngineProgress, Result, ThreadingMode};

/// Observer invoked with raw progress samples during command execution.
pub type ProgressObserver<'a> = &'a (dyn Fn(EngineProgress) + Send + Sync);

/// Shared handle to one initialized engine instance.
pub type EngineHandle = Arc<dyn Engine>;

/// Identity and diagnostics for a loaded engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Which build variant is running.
    pub threading: ThreadingMode,
    /// Version string (first line of the engine's version probe), if known.
    pub version: Option<String>,
    /// Resolved path of the engine binary, if the engine runs from one.
    pub path: Option<PathBuf>,
}

/// Black-box interface to the transcoding engine.
///
/// The engine owns a private file namespace: inputs are staged under
/// synthetic names, commands reference those names, and outputs are read
/// back out by name. Names never contain path separators.
///
/// The engine is not reentrant; callers must serialize `exec` calls (see
/// `EngineSession`).
#[async_trait]
pub trait Engine: Send + Sync + std::fmt::Debug {
    /// Which build variant this engine runs.
    fn threading(&self) -> ThreadingMode;

    /// Identity and diagnostics for this engine.
    fn info(&self) -> EngineInfo;

    /// Copy `bytes` into the engine's private filesystem under `name`.
    async fn stage(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read the file `name` back out of the engine's private filesystem.
    ///
    /// The returned buffer may alias engine-managed memory; callers must
    /// copy it before the next command (see `OutputArtifact::copied_from`).
    async fn retrieve(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove `name` from the engine's private filesystem.
    ///
    /// Removing a name that does not exist is not an error: cleanup runs
    /// unconditionally on failure paths where outputs were never produced.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Run one engine command.
    ///
    /// `operation` labels the invocation for logging and error context.
    /// `args` is the full argument list; file references use staged names.
    /// `observer` receives raw progress samples as the engine reports them.
    async fn exec(
        &self,
        operation: &str,
        args: &[String],
        observer: ProgressObserver<'_>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_info_serialization() {
        let info = EngineInfo {
            threading: ThreadingMode::Single,
            version: Some("ffmpeg version 7.1".to_string()),
            path: Some(PathBuf::from("/usr/bin/ffmpeg")),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"single\""));
        let back: EngineInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.threading, ThreadingMode::Single);
        assert_eq!(back.version.as_deref(), Some("ffmpeg version 7.1"));
    }
}
