//! Persisted workout history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseVariant, SessionSummary};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutStatus {
    Running,
    Completed,
    Cancelled,
    Interrupted,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutStatus::Running => "Running",
            WorkoutStatus::Completed => "Completed",
            WorkoutStatus::Cancelled => "Cancelled",
            WorkoutStatus::Interrupted => "Interrupted",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutMode {
    Live,
    Upload,
}

impl WorkoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutMode::Live => "Live",
            WorkoutMode::Upload => "Upload",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub exercise: ExerciseVariant,
    pub mode: WorkoutMode,
    pub status: WorkoutStatus,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub reps: u32,
    pub correct_form_frames: u64,
    pub total_frames: u64,
    pub skipped_frames: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    /// A fresh `Running` row with zeroed counters.
    pub fn start(exercise: ExerciseVariant, mode: WorkoutMode, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            exercise,
            mode,
            status: WorkoutStatus::Running,
            started_at: now,
            stopped_at: None,
            reps: 0,
            correct_form_frames: 0,
            total_frames: 0,
            skipped_frames: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn form_accuracy_percent(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.correct_form_frames as f64 / self.total_frames as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutInfo {
    pub id: String,
    pub exercise: ExerciseVariant,
    pub mode: WorkoutMode,
    pub status: WorkoutStatus,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub summary: SessionSummary,
}

impl From<Workout> for WorkoutInfo {
    fn from(workout: Workout) -> Self {
        let summary = SessionSummary {
            reps: workout.reps,
            correct_form_frames: workout.correct_form_frames,
            total_frames: workout.total_frames,
            skipped_frames: workout.skipped_frames,
            form_accuracy_percent: workout.form_accuracy_percent(),
        };
        Self {
            id: workout.id,
            exercise: workout.exercise,
            mode: workout.mode,
            status: workout.status,
            started_at: workout.started_at,
            stopped_at: workout.stopped_at,
            summary,
        }
    }
}
