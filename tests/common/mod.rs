//! Shared test harness for integration tests.
//!
//! Provides [`RecordingEngine`], an in-memory engine fake that records
//! staging, execution, and cleanup, can be scripted to fail or emit
//! progress, and produces a placeholder output for every command.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mediasmith::{
    Engine, EngineInfo, EngineProgress, ProgressObserver, ProgressSender, ProgressUpdate, Result,
    ThreadingMode,
};

/// Bytes every scripted command writes as its output.
pub const FAKE_OUTPUT: &[u8] = b"fake-engine-output";

/// An in-memory engine that records everything the adapter does to it.
#[derive(Default, Debug)]
pub struct RecordingEngine {
    /// The private filesystem: name -> content.
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    /// Argument list of every executed command, in order.
    pub exec_log: Mutex<Vec<Vec<String>>>,
    /// Every name removed, in order.
    pub purge_log: Mutex<Vec<String>>,
    /// When set, every exec fails with this message instead of running.
    pub exec_failure: Mutex<Option<String>>,
    /// Raw samples emitted through the observer during each exec.
    pub progress_script: Mutex<Vec<EngineProgress>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script every subsequent exec to fail.
    pub fn fail_exec(&self, message: &str) {
        *self.exec_failure.lock().unwrap() = Some(message.to_string());
    }

    /// Script raw progress samples emitted during each exec.
    pub fn emit_progress(&self, samples: Vec<EngineProgress>) {
        *self.progress_script.lock().unwrap() = samples;
    }

    /// Names currently present in the fake filesystem.
    pub fn remaining_files(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl Engine for RecordingEngine {
    fn threading(&self) -> ThreadingMode {
        ThreadingMode::Multi
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            threading: ThreadingMode::Multi,
            version: Some("recording-engine 1.0".into()),
            path: None,
        }
    }

    async fn stage(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn retrieve(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                mediasmith::Error::from(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    name.to_string(),
                ))
            })
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.files.lock().unwrap().remove(name);
        self.purge_log.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn exec(
        &self,
        operation: &str,
        args: &[String],
        observer: ProgressObserver<'_>,
    ) -> Result<()> {
        if let Some(message) = self.exec_failure.lock().unwrap().clone() {
            return Err(mediasmith::Error::Transcode {
                operation: operation.to_string(),
                message,
            });
        }

        self.exec_log.lock().unwrap().push(args.to_vec());

        let samples: Vec<EngineProgress> = self.progress_script.lock().unwrap().clone();
        for sample in samples {
            observer(sample);
        }

        // Every command's final argument is its output name.
        if let Some(output) = args.last() {
            self.files
                .lock()
                .unwrap()
                .insert(output.clone(), FAKE_OUTPUT.to_vec());
        }
        Ok(())
    }
}

/// A progress sender that appends every update to a shared vector.
pub fn recording_sender() -> (ProgressSender, Arc<Mutex<Vec<ProgressUpdate>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sender = ProgressSender::new(move |u| sink.lock().unwrap().push(u));
    (sender, seen)
}
