// src/metrics.rs

//! Timing and memory measurement for a single sandbox run.
//!
//! Memory is sampled periodically with `sysinfo` and is best-effort: very
//! short-lived spikes may be missed, and if the PID cannot be inspected the
//! tracker simply reports `None`.

use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Metrics collected for one invocation. Logged, never returned to callers.
#[derive(Debug, Clone, Default)]
pub struct InvocationMetrics {
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u128,

    /// Peak RSS memory in KB (best-effort).
    pub peak_rss_kb: Option<u64>,
}

/// Samples the resident set size of a child process until stopped.
pub struct MemoryTracker {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<u64>,
}

impl MemoryTracker {
    /// Start sampling `pid` every `sample_every`.
    ///
    /// Sampling ends on its own once the process is no longer visible.
    pub fn start(pid: u32, sample_every: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let pid = Pid::from_u32(pid);
            let mut system = System::new();
            let mut ticker = tokio::time::interval(sample_every);
            let mut peak_bytes = 0u64;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        system.refresh_process(pid);
                        match system.process(pid) {
                            Some(process) => peak_bytes = peak_bytes.max(process.memory()),
                            None => break,
                        }
                    }
                }
            }

            peak_bytes / 1024
        });

        Self {
            stop: Some(stop_tx),
            handle,
        }
    }

    /// Stop sampling and return the peak RSS in KB, if any sample landed.
    pub async fn stop_and_take(mut self) -> Option<u64> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match (&mut self.handle).await {
            Ok(kb) if kb > 0 => Some(kb),
            _ => None,
        }
    }
}

impl Drop for MemoryTracker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
