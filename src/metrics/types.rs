use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSample {
    pub timestamp: DateTime<Utc>,
    pub frame_index: u64,
    pub detected: bool,
    pub pose_ms: u64,
    pub classify_ms: Option<u64>,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_frames: Vec<FrameSample>,
    pub frame_count: u64,
    pub skipped_count: u64,
    /// Mean `total_ms` over `recent_frames`.
    pub avg_frame_ms: f64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_frames: Vec::new(),
            frame_count: 0,
            skipped_count: 0,
            avg_frame_ms: 0.0,
        }
    }
}
