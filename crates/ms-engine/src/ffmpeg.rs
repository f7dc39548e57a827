//! Subprocess-backed engine implementation.
//!
//! [`FfmpegEngine`] runs an ffmpeg binary resolved by the loader. Its
//! private filesystem is a session temporary directory: staged names are
//! plain filenames inside it, and commands run with that directory as the
//! working directory so argument lists reference bare names only.
//!
//! Progress is streamed by running every command with `-progress pipe:2
//! -nostats` and parsing the key/value blocks off stderr, combined with the
//! input duration printed in the stream header.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use ms_core::{EngineProgress, Error, Result, ThreadingMode};

use crate::engine::{Engine, EngineInfo, ProgressObserver};

/// Number of trailing stderr lines kept for error context.
const STDERR_TAIL: usize = 24;

/// An engine instance backed by a spawned ffmpeg process per command.
#[derive(Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
    threading: ThreadingMode,
    version: Option<String>,
    fs_root: TempDir,
    command_timeout: Option<Duration>,
}

impl FfmpegEngine {
    /// Create an engine around a resolved binary.
    ///
    /// Creates the private filesystem directory; it is removed when the
    /// engine is dropped (explicit session teardown).
    pub fn new(
        binary: PathBuf,
        threading: ThreadingMode,
        version: Option<String>,
        command_timeout: Option<Duration>,
    ) -> Result<Self> {
        let fs_root = TempDir::new()?;
        Ok(Self {
            binary,
            threading,
            version,
            fs_root,
            command_timeout,
        })
    }

    /// Path of the private filesystem root (visible for tests).
    pub fn fs_root(&self) -> &Path {
        self.fs_root.path()
    }

    /// Resolve a staged name inside the private filesystem.
    ///
    /// Names are bare filenames; anything that could escape the namespace
    /// is rejected.
    fn checked_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(Error::Validation(format!(
                "invalid staged file name: {name:?}"
            )));
        }
        Ok(self.fs_root.path().join(name))
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn threading(&self) -> ThreadingMode {
        self.threading
    }

    fn info(&self) -> EngineInfo {
        EngineInfo {
            threading: self.threading,
            version: self.version.clone(),
            path: Some(self.binary.clone()),
        }
    }

    async fn stage(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.checked_path(name)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("staged {name} ({} bytes)", bytes.len());
        Ok(())
    }

    async fn retrieve(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.checked_path(name)?;
        let bytes = tokio::fs::read(&path).await?;
        tracing::debug!("retrieved {name} ({} bytes)", bytes.len());
        Ok(bytes)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.checked_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exec(
        &self,
        operation: &str,
        args: &[String],
        observer: ProgressObserver<'_>,
    ) -> Result<()> {
        let mut full_args: Vec<String> = vec![
            "-y".into(),
            "-progress".into(),
            "pipe:2".into(),
            "-nostats".into(),
        ];
        full_args.extend_from_slice(args);

        // The single-threaded build variant constrains the encode; the flag
        // goes in output position, directly before the output name.
        if self.threading == ThreadingMode::Single && !args.is_empty() {
            let at = full_args.len() - 1;
            full_args.splice(at..at, ["-threads".into(), "1".into()]);
        }

        tracing::debug!("[{operation}] engine exec: {}", full_args.join(" "));

        let mut cmd = Command::new(&self.binary);
        cmd.args(&full_args)
            .current_dir(self.fs_root.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::transcode(operation, format!("failed to start engine: {e}"))
        })?;

        let stderr = child.stderr.take().ok_or_else(|| {
            Error::transcode(operation, "engine stderr was not captured")
        })?;

        let mut parser = ProgressParser::new(window_duration(args));
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

        let work = async {
            let mut lines = BufReader::new(stderr).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(progress) = parser.feed(&line) {
                    observer(progress);
                }
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            child.wait().await.map_err(Error::from)
        };

        let status = match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                // The cancelled future drops the child; kill_on_drop reaps it.
                Error::transcode(operation, format!("engine timed out after {limit:?}"))
            })??,
            None => work.await?,
        };

        if !status.success() {
            let context: Vec<String> = tail.into_iter().collect();
            return Err(Error::transcode(
                operation,
                format!("engine exited with {status}: {}", context.join("\n")),
            ));
        }

        Ok(())
    }
}

/// Scan an argument list for an explicit `-t <seconds>` output window.
///
/// When present it bounds the output duration, which is what `out_time`
/// runs against; the header duration covers the whole input instead.
fn window_duration(args: &[String]) -> Option<f64> {
    args.windows(2)
        .find(|w| w[0] == "-t")
        .and_then(|w| w[1].parse::<f64>().ok())
        .filter(|d| *d > 0.0)
}

// ---------------------------------------------------------------------------
// Progress stream parsing
// ---------------------------------------------------------------------------

/// Incremental parser for the engine's stderr progress stream.
///
/// Understands the `Duration: HH:MM:SS.cc` header line (first input wins)
/// and `-progress` key/value blocks terminated by `progress=`.
struct ProgressParser {
    duration_secs: Option<f64>,
    out_time_us: Option<i64>,
}

impl ProgressParser {
    fn new(window: Option<f64>) -> Self {
        Self {
            duration_secs: window,
            out_time_us: None,
        }
    }

    /// Consume one stderr line; returns a sample when a block completes.
    fn feed(&mut self, line: &str) -> Option<EngineProgress> {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("Duration:") {
            if self.duration_secs.is_none() {
                self.duration_secs = rest
                    .split(',')
                    .next()
                    .and_then(|clock| parse_clock(clock.trim()));
            }
            return None;
        }

        if let Some(val) = trimmed.strip_prefix("out_time_us=") {
            self.out_time_us = val.trim().parse::<i64>().ok();
            return None;
        }

        if trimmed.starts_with("progress=") {
            let fraction = match (self.out_time_us, self.duration_secs) {
                (Some(out_us), Some(dur)) if dur > 0.0 => {
                    ((out_us as f64 / 1_000_000.0) / dur).clamp(0.0, 1.0)
                }
                _ => 0.0,
            };
            return Some(EngineProgress {
                fraction,
                time_us: self.out_time_us,
            });
        }

        None
    }
}

/// Parse `HH:MM:SS.cc` into seconds.
fn parse_clock(clock: &str) -> Option<f64> {
    let mut parts = clock.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> FfmpegEngine {
        FfmpegEngine::new(
            PathBuf::from("nonexistent_engine_xyz"),
            ThreadingMode::Multi,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn parse_clock_values() {
        assert_eq!(parse_clock("00:00:10.00"), Some(10.0));
        assert_eq!(parse_clock("01:02:03.50"), Some(3723.5));
        assert_eq!(parse_clock("N/A"), None);
    }

    #[test]
    fn parser_derives_fraction_from_header() {
        let mut p = ProgressParser::new(None);
        assert!(p.feed("  Duration: 00:00:10.00, start: 0.0, bitrate:").is_none());
        assert!(p.feed("out_time_us=5000000").is_none());
        let sample = p.feed("progress=continue").unwrap();
        assert!((sample.fraction - 0.5).abs() < 1e-9);
        assert_eq!(sample.time_us, Some(5_000_000));
    }

    #[test]
    fn parser_first_duration_wins() {
        let mut p = ProgressParser::new(None);
        p.feed("  Duration: 00:00:10.00, start: 0.0");
        p.feed("  Duration: 00:00:00.04, start: 0.0");
        p.feed("out_time_us=10000000");
        let sample = p.feed("progress=end").unwrap();
        assert!((sample.fraction - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parser_prefers_explicit_window() {
        let mut p = ProgressParser::new(Some(3.0));
        p.feed("  Duration: 00:01:00.00, start: 0.0");
        p.feed("out_time_us=1500000");
        let sample = p.feed("progress=continue").unwrap();
        assert!((sample.fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn parser_without_duration_reports_zero_fraction() {
        let mut p = ProgressParser::new(None);
        p.feed("out_time_us=1000000");
        let sample = p.feed("progress=continue").unwrap();
        assert_eq!(sample.fraction, 0.0);
        assert_eq!(sample.time_us, Some(1_000_000));
    }

    #[test]
    fn window_duration_scans_args() {
        let args: Vec<String> = ["-ss", "2", "-t", "3", "-i", "input.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(window_duration(&args), Some(3.0));
        assert_eq!(window_duration(&args[..2].to_vec()), None);
    }

    #[tokio::test]
    async fn stage_retrieve_remove_roundtrip() {
        let engine = test_engine();
        engine.stage("input.mp4", b"abc").await.unwrap();
        assert_eq!(engine.retrieve("input.mp4").await.unwrap(), b"abc");
        engine.remove("input.mp4").await.unwrap();
        assert!(engine.retrieve("input.mp4").await.is_err());
    }

    #[tokio::test]
    async fn remove_missing_name_is_ok() {
        let engine = test_engine();
        engine.remove("never-staged.bin").await.unwrap();
    }

    #[tokio::test]
    async fn stage_rejects_escaping_names() {
        let engine = test_engine();
        assert!(engine.stage("../escape", b"x").await.is_err());
        assert!(engine.stage("a/b", b"x").await.is_err());
        assert!(engine.stage("", b"x").await.is_err());
    }

    #[tokio::test]
    async fn exec_spawn_failure_is_transcode_error() {
        let engine = test_engine();
        let err = engine
            .exec("extract-audio", &["-i".into(), "input.mp4".into()], &|_| {})
            .await
            .unwrap_err();
        match err {
            Error::Transcode { operation, message } => {
                assert_eq!(operation, "extract-audio");
                assert!(message.contains("failed to start engine"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
