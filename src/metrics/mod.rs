//! Processing telemetry: per-frame timings and process resource usage.

mod types;

pub use types::{FrameSample, MetricsSnapshot, SystemMetrics};

use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

use crate::engine::FrameTimings;

const MAX_RECENT_FRAMES: usize = 20;

pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_frames: Vec<FrameSample>,
    frame_count: u64,
    skipped_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // CPU usage is a delta between refreshes; take the baseline now.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_frames: Vec::with_capacity(MAX_RECENT_FRAMES),
                frame_count: 0,
                skipped_count: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_frame(&self, frame_index: u64, detected: bool, timings: FrameTimings) {
        let mut state = self.inner.lock().await;

        state.frame_count += 1;
        if !detected {
            state.skipped_count += 1;
        }

        state.recent_frames.push(FrameSample {
            timestamp: chrono::Utc::now(),
            frame_index,
            detected,
            pose_ms: timings.pose_ms,
            classify_ms: timings.classify_ms,
            total_ms: timings.total_ms,
        });

        if state.recent_frames.len() > MAX_RECENT_FRAMES {
            state.recent_frames.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;

        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system_metrics = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        let avg_frame_ms = if state.recent_frames.is_empty() {
            0.0
        } else {
            state.recent_frames.iter().map(|s| s.total_ms as f64).sum::<f64>()
                / state.recent_frames.len() as f64
        };

        MetricsSnapshot {
            system: system_metrics,
            recent_frames: state.recent_frames.clone(),
            frame_count: state.frame_count,
            skipped_count: state.skipped_count,
            avg_frame_ms,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_frames.clear();
        state.frame_count = 0;
        state.skipped_count = 0;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_a_bounded_window() {
        let collector = MetricsCollector::new();
        for i in 0..(MAX_RECENT_FRAMES as u64 + 5) {
            let timings = FrameTimings {
                pose_ms: 1,
                classify_ms: Some(1),
                total_ms: 2,
            };
            collector.record_frame(i, i % 5 != 0, timings).await;
        }

        let snapshot = collector.get_snapshot().await;
        assert_eq!(snapshot.frame_count, 25);
        assert_eq!(snapshot.skipped_count, 5);
        assert_eq!(snapshot.recent_frames.len(), MAX_RECENT_FRAMES);
        assert_eq!(snapshot.recent_frames[0].frame_index, 5);
        assert_eq!(snapshot.avg_frame_ms, 2.0);

        collector.reset().await;
        assert_eq!(collector.get_snapshot().await.frame_count, 0);
    }
}
