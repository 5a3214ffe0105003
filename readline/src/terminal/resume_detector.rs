// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::{Duration, Instant};
use tokio::{task::JoinHandle,
            time::{MissedTickBehavior, interval}};

/// How often the detector looks at the clock.
pub const RESUME_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A gap between two polls longer than this means the process was stopped.
pub const RESUME_GAP_THRESHOLD: Duration = Duration::from_millis(100);

/// Notices that the process was stopped and then continued.
///
/// There is no portable "you were just resumed" notification, so this polls a
/// monotonic clock on a short interval. While the process is stopped nothing runs, so
/// the first poll after `SIGCONT` sees a gap far larger than normal scheduling jitter.
///
/// Spawn it *before* suspending. The reference instant is taken in [`Self::spawn()`],
/// so a freeze that starts before the task is first polled is still measured.
#[derive(Debug)]
pub struct ResumeDetector {
    handle: JoinHandle<Duration>,
}

impl ResumeDetector {
    #[must_use]
    pub fn spawn() -> Self { Self::spawn_with(RESUME_POLL_INTERVAL, RESUME_GAP_THRESHOLD) }

    #[must_use]
    pub fn spawn_with(poll_interval: Duration, gap_threshold: Duration) -> Self {
        let started_at = Instant::now();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = started_at;
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let gap = now.duration_since(last);
                if gap > gap_threshold {
                    return gap;
                }
                last = now;
            }
        });
        Self { handle }
    }

    /// Resolves with the observed gap once a resume has been detected.
    pub async fn wait(self) -> Duration {
        match self.handle.await {
            Ok(gap) => gap,
            Err(error) => {
                tracing::warn!(message = "resume detector task failed", error = ?error);
                Duration::ZERO
            }
        }
    }

    pub fn abort(&self) { self.handle.abort(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_freeze_is_detected() {
        let detector = ResumeDetector::spawn();
        // Blocking the only runtime thread is what a stopped process looks like.
        std::thread::sleep(Duration::from_millis(150));
        let gap = detector.wait().await;
        assert!(gap > RESUME_GAP_THRESHOLD);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_no_freeze_keeps_polling() {
        let detector = ResumeDetector::spawn_with(
            Duration::from_millis(10),
            Duration::from_secs(5),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!detector.handle.is_finished());
        detector.abort();
    }
}
