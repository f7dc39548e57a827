//! The per-session toolbox callers hold.
//!
//! [`MediaToolbox`] owns the engine loader and the session built on first
//! use, and exposes the operation surface the UI layer calls: extract
//! audio, remove audio, make an animated image, watermark an image. The
//! engine loads lazily on the first engine-backed operation and is torn
//! down only by explicit [`terminate`](MediaToolbox::terminate).

use std::sync::Arc;
use std::sync::OnceLock;

use tokio::sync::Mutex;

use ms_core::config::EngineConfig;
use ms_core::{AudioTarget, Error, OutputArtifact, ProgressSender, Result};
use ms_engine::{AnimatedImageOptions, EngineInfo, EngineLoader, EngineSession, SourceFile};
use ms_raster::{Compositor, WatermarkFont, WatermarkSpec};

/// Session-scoped entry point for all media operations.
pub struct MediaToolbox {
    loader: EngineLoader,
    session: Mutex<Option<Arc<EngineSession>>>,
    compositor: OnceLock<Option<Compositor>>,
}

impl MediaToolbox {
    /// Create a toolbox; the engine is not touched until the first
    /// engine-backed operation.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            loader: EngineLoader::new(config),
            session: Mutex::new(None),
            compositor: OnceLock::new(),
        }
    }

    /// Use `font` for watermark text instead of discovering a system face.
    pub fn with_watermark_font(self, font: WatermarkFont) -> Self {
        let _ = self.compositor.set(Some(Compositor::new(font)));
        self
    }

    /// Whether the engine finished loading.
    pub fn is_engine_loaded(&self) -> bool {
        self.loader.is_loaded()
    }

    /// Whether an engine load attempt is in flight.
    pub fn is_engine_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// The session, loading the engine on first call.
    pub async fn session(&self) -> Result<Arc<EngineSession>> {
        let mut session = self.session.lock().await;
        if let Some(existing) = session.as_ref() {
            return Ok(existing.clone());
        }
        let handle = self.loader.ensure_loaded().await?;
        let created = Arc::new(EngineSession::new(handle));
        *session = Some(created.clone());
        Ok(created)
    }

    /// Identity of the loaded engine, if any.
    pub async fn engine_info(&self) -> Option<EngineInfo> {
        self.session.lock().await.as_ref().map(|s| s.info())
    }

    /// Explicitly tear the engine down.
    ///
    /// The next engine-backed operation starts a fresh load.
    pub async fn terminate(&self) {
        if self.session.lock().await.take().is_some() {
            tracing::info!("toolbox session released");
        }
        self.loader.terminate().await;
    }

    /// Extract the audio track of `source` into the requested codec.
    pub async fn extract_audio(
        &self,
        source: SourceFile<'_>,
        target: AudioTarget,
        progress: &ProgressSender,
    ) -> Result<OutputArtifact> {
        self.session().await?.extract_audio(source, target, progress).await
    }

    /// Remove the audio track of `source` without re-encoding the video.
    pub async fn remove_audio(
        &self,
        source: SourceFile<'_>,
        progress: &ProgressSender,
    ) -> Result<OutputArtifact> {
        self.session().await?.remove_audio(source, progress).await
    }

    /// Produce an animated GIF from a clip of `source`.
    pub async fn animated_image(
        &self,
        source: SourceFile<'_>,
        options: AnimatedImageOptions,
        progress: &ProgressSender,
    ) -> Result<OutputArtifact> {
        self.session()
            .await?
            .animated_image(source, options, progress)
            .await
    }

    /// Overlay a watermark on a static image.
    ///
    /// Independent of the engine: runs synchronously and may overlap an
    /// in-flight engine operation.
    pub fn watermark(&self, image_bytes: &[u8], spec: &WatermarkSpec) -> Result<OutputArtifact> {
        let compositor = self
            .compositor
            .get_or_init(|| WatermarkFont::discover().map(Compositor::new))
            .as_ref()
            .ok_or_else(|| {
                Error::Surface(
                    "no watermark font available; supply one with with_watermark_font".into(),
                )
            })?;
        compositor.composite(image_bytes, spec)
    }
}
