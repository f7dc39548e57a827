//! Progress reporting primitives.
//!
//! The engine emits a raw stream of [`EngineProgress`] values; the adapter
//! projects them into UI-facing [`ProgressUpdate`]s and delivers them
//! through a caller-supplied [`ProgressSender`].

use serde::{Deserialize, Serialize};

/// A raw progress sample from the engine.
///
/// The stream fires at irregular intervals and is not guaranteed to reach
/// exactly 1.0; completion is determined by the operation result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineProgress {
    /// Fractional completion in `0.0..=1.0`.
    pub fraction: f64,
    /// Elapsed media time in engine-native microseconds, when reported.
    pub time_us: Option<i64>,
}

/// A projected progress value as consumed by UI callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Completion percentage in `0..=100`.
    pub percent: u8,
    /// Elapsed media time in seconds, when the engine reported one.
    pub elapsed_seconds: Option<f64>,
}

/// Sender for delivering projected progress to the caller.
///
/// Wraps a callback so the UI layer decides how updates are surfaced
/// (channel, event bus, direct render).
pub struct ProgressSender {
    callback: Box<dyn Fn(ProgressUpdate) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(ProgressUpdate) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    /// Deliver an update.
    pub fn send(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn sender_delivers_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sender = ProgressSender::new(move |u| sink.lock().unwrap().push(u));

        sender.send(ProgressUpdate {
            percent: 40,
            elapsed_seconds: Some(4.0),
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].percent, 40);
        assert_eq!(seen[0].elapsed_seconds, Some(4.0));
    }

    #[test]
    fn noop_sender_does_not_panic() {
        ProgressSender::noop().send(ProgressUpdate {
            percent: 100,
            elapsed_seconds: None,
        });
    }
}
