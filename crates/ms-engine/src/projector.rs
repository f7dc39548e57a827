//! Projection of the engine's raw progress stream into UI-facing updates.
//!
//! The projector converts fractional completion into a rounded integer
//! percentage and engine-native microseconds into seconds, clamps the
//! result into the current operation window, and suppresses regressions so
//! the published sequence is monotonically non-decreasing. It is re-zeroed
//! at the start of every operation.

use std::sync::atomic::{AtomicU8, Ordering};

use ms_core::{EngineProgress, ProgressSender, ProgressUpdate};

/// Projects raw engine progress into percentages for one operation.
pub struct ProgressProjector<'a> {
    sender: &'a ProgressSender,
    window_lo: AtomicU8,
    window_hi: AtomicU8,
    last_percent: AtomicU8,
}

impl<'a> ProgressProjector<'a> {
    /// Create a projector covering the full 0-100 window.
    pub fn new(sender: &'a ProgressSender) -> Self {
        Self {
            sender,
            window_lo: AtomicU8::new(0),
            window_hi: AtomicU8::new(100),
            last_percent: AtomicU8::new(0),
        }
    }

    /// Publish the zeroed progress that opens an operation.
    pub fn begin(&self) {
        self.last_percent.store(0, Ordering::Relaxed);
        self.sender.send(ProgressUpdate {
            percent: 0,
            elapsed_seconds: None,
        });
    }

    /// Map subsequent raw samples into `lo..=hi` (multi-pass operations
    /// give each pass its share of the bar).
    pub fn set_window(&self, lo: u8, hi: u8) {
        debug_assert!(lo <= hi && hi <= 100);
        self.window_lo.store(lo, Ordering::Relaxed);
        self.window_hi.store(hi, Ordering::Relaxed);
    }

    /// Observe one raw engine sample.
    pub fn observe(&self, raw: EngineProgress) {
        let lo = self.window_lo.load(Ordering::Relaxed) as f64;
        let hi = self.window_hi.load(Ordering::Relaxed) as f64;
        let fraction = raw.fraction.clamp(0.0, 1.0);
        let percent = (lo + fraction * (hi - lo)).round() as u8;
        self.publish(percent, raw.time_us.map(|us| us as f64 / 1_000_000.0));
    }

    /// Publish an explicit milestone (e.g. 50 after the first pass of a
    /// two-pass encode, 100 on completion).
    pub fn mark(&self, percent: u8) {
        self.publish(percent.min(100), None);
    }

    fn publish(&self, percent: u8, elapsed_seconds: Option<f64>) {
        // Keep the published sequence non-decreasing; the raw stream is
        // allowed to jitter backwards and never has to reach 1.0.
        let prev = self.last_percent.fetch_max(percent, Ordering::Relaxed);
        if percent < prev {
            return;
        }
        self.sender.send(ProgressUpdate {
            percent,
            elapsed_seconds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_sender() -> (ProgressSender, Arc<Mutex<Vec<ProgressUpdate>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sender = ProgressSender::new(move |u| sink.lock().unwrap().push(u));
        (sender, seen)
    }

    #[test]
    fn rounds_fraction_to_percent() {
        let (sender, seen) = recording_sender();
        let projector = ProgressProjector::new(&sender);
        projector.observe(EngineProgress {
            fraction: 0.444,
            time_us: Some(2_500_000),
        });
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].percent, 44);
        assert_eq!(seen[0].elapsed_seconds, Some(2.5));
    }

    #[test]
    fn begin_re_zeroes() {
        let (sender, seen) = recording_sender();
        let projector = ProgressProjector::new(&sender);
        projector.observe(EngineProgress {
            fraction: 0.8,
            time_us: None,
        });
        projector.begin();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().unwrap().percent, 0);
    }

    #[test]
    fn suppresses_regressions() {
        let (sender, seen) = recording_sender();
        let projector = ProgressProjector::new(&sender);
        projector.observe(EngineProgress {
            fraction: 0.6,
            time_us: None,
        });
        projector.observe(EngineProgress {
            fraction: 0.4,
            time_us: None,
        });
        projector.observe(EngineProgress {
            fraction: 0.9,
            time_us: None,
        });
        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|u| u.percent).collect();
        assert_eq!(percents, vec![60, 90]);
    }

    #[test]
    fn window_scales_passes() {
        let (sender, seen) = recording_sender();
        let projector = ProgressProjector::new(&sender);
        projector.set_window(0, 50);
        projector.observe(EngineProgress {
            fraction: 1.0,
            time_us: None,
        });
        projector.set_window(50, 100);
        projector.observe(EngineProgress {
            fraction: 0.5,
            time_us: None,
        });
        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|u| u.percent).collect();
        assert_eq!(percents, vec![50, 75]);
    }

    #[test]
    fn mark_caps_at_100_and_stays_monotonic() {
        let (sender, seen) = recording_sender();
        let projector = ProgressProjector::new(&sender);
        projector.mark(50);
        projector.mark(40);
        projector.mark(110);
        let percents: Vec<u8> = seen.lock().unwrap().iter().map(|u| u.percent).collect();
        assert_eq!(percents, vec![50, 100]);
    }

    #[test]
    fn overshooting_fraction_is_clamped() {
        let (sender, seen) = recording_sender();
        let projector = ProgressProjector::new(&sender);
        projector.observe(EngineProgress {
            fraction: 1.7,
            time_us: None,
        });
        assert_eq!(seen.lock().unwrap()[0].percent, 100);
    }
}
