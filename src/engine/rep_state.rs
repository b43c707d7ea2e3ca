//! Rep-counting state machine and per-session form aggregation.

use serde::{Deserialize, Serialize};

use crate::models::{FrameMetrics, Thresholds};

/// Where the limb is in the current rep cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Extended past the `extended` threshold; the next contraction counts.
    Down,
    /// Contracted after a counted rep; must extend again before the next one.
    Up,
}

/// Session-scoped rep tracking. Owned by exactly one session and only
/// mutated through [`update_rep_state`] and [`aggregate_metrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepState {
    stage: Option<Stage>,
    reps: u32,
    correct_form_count: u64,
    total_frames: u64,
}

impl RepState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first extension is seen.
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn correct_form_count(&self) -> u64 {
        self.correct_form_count
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn form_accuracy_percent(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            100.0 * self.correct_form_count as f64 / self.total_frames as f64
        }
    }
}

/// Advances the stage for one frame and counts a rep on a valid contraction.
///
/// Both rules run on every call, re-arm first:
/// 1. `angle > extended` sets the stage to `Down`.
/// 2. `angle < contracted`, stage `Down` and good form sets the stage to `Up`
///    and counts a rep.
///
/// With `extended > contracted` a single call can satisfy at most one rule,
/// so a rep always needs a prior extension and cannot be counted twice in
/// one contraction. Bad form vetoes the rep and leaves the stage armed.
pub fn update_rep_state(
    state: &mut RepState,
    elbow_angle: f64,
    correct_form: bool,
    thresholds: &Thresholds,
) {
    if elbow_angle > thresholds.extended {
        state.stage = Some(Stage::Down);
    }
    if elbow_angle < thresholds.contracted && state.stage == Some(Stage::Down) && correct_form {
        state.stage = Some(Stage::Up);
        state.reps = state.reps.saturating_add(1);
    }
}

/// Folds one processed frame into the session's form statistics and returns
/// the frame's metrics record.
pub fn aggregate_metrics(state: &mut RepState, elbow_angle: f64, correct_form: bool) -> FrameMetrics {
    state.total_frames += 1;
    if correct_form {
        state.correct_form_count += 1;
    }

    FrameMetrics {
        reps: state.reps,
        form_accuracy_percent: state.form_accuracy_percent(),
        correct_form,
        elbow_angle_degrees: elbow_angle,
    }
}
