use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::WorkoutMode;
use crate::models::ExerciseVariant;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutPhase {
    #[default]
    Idle,
    Running,
    /// The frame source ran out before the workout was ended.
    Stopped,
}

impl WorkoutPhase {
    pub fn label(&self) -> &'static str {
        match self {
            WorkoutPhase::Idle => "idle",
            WorkoutPhase::Running => "running",
            WorkoutPhase::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutState {
    pub phase: WorkoutPhase,
    pub workout_id: Option<String>,
    pub exercise: Option<ExerciseVariant>,
    pub mode: Option<WorkoutMode>,
    pub started_at: Option<DateTime<Utc>>,
}

impl WorkoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == WorkoutPhase::Idle
    }

    pub fn holds(&self, workout_id: &str) -> bool {
        self.workout_id.as_deref() == Some(workout_id)
    }

    pub fn begin(
        &mut self,
        workout_id: String,
        exercise: ExerciseVariant,
        mode: WorkoutMode,
        started_at: DateTime<Utc>,
    ) {
        *self = Self {
            phase: WorkoutPhase::Running,
            workout_id: Some(workout_id),
            exercise: Some(exercise),
            mode: Some(mode),
            started_at: Some(started_at),
        };
    }

    pub fn stop(&mut self) {
        if self.phase == WorkoutPhase::Running {
            self.phase = WorkoutPhase::Stopped;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
