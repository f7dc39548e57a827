//! Lazy, once-per-session engine initialization.
//!
//! [`EngineLoader`] resolves and initializes the transcoding engine on
//! first use: the multi-threaded build variant is tried first, and on any
//! initialization failure the single-threaded build is tried once. When
//! both fail the loader stays in the never-loaded state so a later call
//! can retry, and the returned error carries both causes.
//!
//! Per build variant, resolution order is: explicit configured path, a
//! previously fetched copy in the session cache, a one-time fetch from the
//! configured versioned URL, then `PATH` lookup.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::Mutex;

use ms_core::config::{EngineBuildConfig, EngineConfig};
use ms_core::{Error, Result, ThreadingMode};

use crate::engine::EngineHandle;
use crate::ffmpeg::FfmpegEngine;

/// Lazily initializes and caches the session's engine instance.
pub struct EngineLoader {
    config: EngineConfig,
    http: reqwest::Client,
    state: Mutex<Option<EngineHandle>>,
    session_cache: Mutex<Option<TempDir>>,
    loaded: AtomicBool,
    loading: AtomicBool,
}

impl EngineLoader {
    /// Create a loader; nothing is fetched or spawned until
    /// [`ensure_loaded`](Self::ensure_loaded).
    pub fn new(config: EngineConfig) -> Self {
        for warning in config.validate() {
            tracing::warn!("engine config: {warning}");
        }
        Self {
            config,
            http: reqwest::Client::new(),
            state: Mutex::new(None),
            session_cache: Mutex::new(None),
            loaded: AtomicBool::new(false),
            loading: AtomicBool::new(false),
        }
    }

    /// Whether a handle is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }

    /// Whether an initialization attempt is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    /// Return the session engine, initializing it on first call.
    ///
    /// Idempotent: concurrent callers share one initialization, and once a
    /// handle exists it is returned without touching the network or the
    /// filesystem again. After a total failure the loader remains
    /// never-loaded, so a later call retries from scratch.
    pub async fn ensure_loaded(&self) -> Result<EngineHandle> {
        let mut state = self.state.lock().await;
        if let Some(handle) = state.as_ref() {
            return Ok(handle.clone());
        }

        self.loading.store(true, Ordering::Relaxed);
        let result = self.initialize().await;
        self.loading.store(false, Ordering::Relaxed);

        let handle = result?;
        *state = Some(handle.clone());
        self.loaded.store(true, Ordering::Relaxed);
        Ok(handle)
    }

    /// Explicitly tear down the session engine.
    ///
    /// The engine's private filesystem is removed once the last session
    /// holding the handle drops it. A subsequent
    /// [`ensure_loaded`](Self::ensure_loaded) starts a fresh initialization.
    pub async fn terminate(&self) {
        let mut state = self.state.lock().await;
        if state.take().is_some() {
            self.loaded.store(false, Ordering::Relaxed);
            tracing::info!("engine terminated");
        }
    }

    async fn initialize(&self) -> Result<EngineHandle> {
        match self
            .init_variant(&self.config.multi_threaded, ThreadingMode::Multi)
            .await
        {
            Ok(engine) => Ok(engine),
            Err(multi) => {
                tracing::warn!(
                    "multi-threaded engine build failed to initialize: {multi}; \
                     retrying with the single-threaded build"
                );
                match self
                    .init_variant(&self.config.single_threaded, ThreadingMode::Single)
                    .await
                {
                    Ok(engine) => Ok(engine),
                    Err(single) => Err(Error::load(multi.to_string(), single.to_string())),
                }
            }
        }
    }

    async fn init_variant(
        &self,
        build: &EngineBuildConfig,
        mode: ThreadingMode,
    ) -> Result<EngineHandle> {
        let binary = self.resolve(build, mode).await?;
        let version = probe_version(&binary).await?;
        let engine = FfmpegEngine::new(
            binary.clone(),
            mode,
            version.clone(),
            self.config.command_timeout(),
        )?;
        tracing::info!(
            "engine loaded ({mode}) from {} ({})",
            binary.display(),
            version.as_deref().unwrap_or("unknown version")
        );
        Ok(Arc::new(engine))
    }

    async fn resolve(&self, build: &EngineBuildConfig, mode: ThreadingMode) -> Result<PathBuf> {
        if let Some(path) = &build.binary_path {
            if path.exists() {
                return Ok(path.clone());
            }
            tracing::warn!(
                "configured engine path does not exist: {}; trying other sources",
                path.display()
            );
        }

        if let Some(url) = &build.fetch_url {
            let cached = self.cache_path(build, mode).await?;
            if !cached.exists() {
                self.fetch(url, &cached).await?;
            }
            return Ok(cached);
        }

        which::which(&build.lookup_name).map_err(|e| {
            Error::from(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("engine binary {:?} not found in PATH: {e}", build.lookup_name),
            ))
        })
    }

    /// Location a fetched binary for `mode` is cached at for this session.
    async fn cache_path(&self, build: &EngineBuildConfig, mode: ThreadingMode) -> Result<PathBuf> {
        let file_name = format!("{}-{mode}", build.lookup_name);
        if let Some(dir) = &self.config.cache_dir {
            tokio::fs::create_dir_all(dir).await?;
            return Ok(dir.join(file_name));
        }

        let mut cache = self.session_cache.lock().await;
        if cache.is_none() {
            *cache = Some(TempDir::new()?);
        }
        Ok(cache.as_ref().unwrap().path().join(file_name))
    }

    /// One-time fetch of an engine binary asset.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("fetching engine binary from {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        tokio::fs::write(dest, &bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = tokio::fs::metadata(dest).await?.permissions();
            perms.set_mode(0o755);
            tokio::fs::set_permissions(dest, perms).await?;
        }

        Ok(())
    }
}

/// Run the binary's version probe and return the first output line.
///
/// A spawn failure or non-zero exit fails initialization for this build
/// variant; empty output is tolerated (the version is diagnostics only).
async fn probe_version(binary: &Path) -> Result<Option<String>> {
    let output = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::transcode(
            "initialize",
            format!("version probe exited with {}", output.status),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string()))
}
