//! Staged-name bookkeeping for the engine's private filesystem.
//!
//! Every name an operation stages or expects a command to produce is
//! tracked in a [`StagedSet`] and purged unconditionally once the
//! operation settles, so the namespace cannot grow across many sequential
//! tool uses in one session.

use ms_core::canonical_extension;

use crate::engine::Engine;

/// Synthetic input name for a source file, keyed by its canonical extension.
pub fn input_name(source_name: Option<&str>) -> String {
    format!("input.{}", canonical_extension(source_name))
}

/// The set of names owned by one in-flight operation.
#[derive(Debug, Default)]
pub struct StagedSet {
    names: Vec<String>,
}

impl StagedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name as owned by this operation, returning it back.
    pub fn track(&mut self, name: String) -> String {
        self.names.push(name.clone());
        name
    }

    /// Tracked names, in staging order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Remove every tracked name from the engine's filesystem.
    ///
    /// Runs on success and failure paths alike. Removal failures are logged
    /// and swallowed so cleanup never masks the operation's own result;
    /// names a failed command never produced are simply absent.
    pub async fn purge(&self, engine: &dyn Engine) {
        for name in &self.names {
            if let Err(e) = engine.remove(name).await {
                tracing::warn!("failed to purge staged file {name}: {e}");
            }
        }
    }
}
