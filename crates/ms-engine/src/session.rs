//! One engine, one operation at a time.
//!
//! [`EngineSession`] is the explicitly passed handle callers run operations
//! against. The engine is not reentrant, so the session serializes
//! operations through an async mutex: a request issued while another is in
//! flight waits for it to settle instead of corrupting either output.

use tokio::sync::Mutex;

use ms_core::{AudioTarget, OutputArtifact, ProgressSender, Result, ThreadingMode};

use crate::engine::{EngineHandle, EngineInfo};
use crate::ops::{self, AnimatedImageOptions, SourceFile};

/// A loaded engine plus the single-flight gate for its operations.
pub struct EngineSession {
    engine: EngineHandle,
    flight: Mutex<()>,
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("engine", &self.engine.info())
            .finish()
    }
}

impl EngineSession {
    /// Wrap a loaded engine handle.
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            flight: Mutex::new(()),
        }
    }

    /// Which build variant the session runs.
    pub fn threading(&self) -> ThreadingMode {
        self.engine.threading()
    }

    /// Identity and diagnostics for the loaded engine.
    pub fn info(&self) -> EngineInfo {
        self.engine.info()
    }

    /// Extract the audio track into the requested codec.
    pub async fn extract_audio(
        &self,
        source: SourceFile<'_>,
        target: AudioTarget,
        progress: &ProgressSender,
    ) -> Result<OutputArtifact> {
        let _flight = self.flight.lock().await;
        ops::run_extract_audio(self.engine.as_ref(), source, target, progress).await
    }

    /// Remove the audio track, stream-copying the video.
    pub async fn remove_audio(
        &self,
        source: SourceFile<'_>,
        progress: &ProgressSender,
    ) -> Result<OutputArtifact> {
        let _flight = self.flight.lock().await;
        ops::run_remove_audio(self.engine.as_ref(), source, progress).await
    }

    /// Produce an animated GIF from a clip of the source.
    pub async fn animated_image(
        &self,
        source: SourceFile<'_>,
        options: AnimatedImageOptions,
        progress: &ProgressSender,
    ) -> Result<OutputArtifact> {
        let _flight = self.flight.lock().await;
        ops::run_animated_image(self.engine.as_ref(), source, options, progress).await
    }
}
