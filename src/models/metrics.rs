use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-frame output for the display layer. Built once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetrics {
    pub reps: u32,
    pub form_accuracy_percent: f64,
    pub correct_form: bool,
    pub elbow_angle_degrees: f64,
}

impl FrameMetrics {
    pub fn form_label(&self) -> &'static str {
        if self.correct_form {
            "Correct"
        } else {
            "Incorrect"
        }
    }

    /// Short labels drawn over the video frame: reps, whole-degree angle, form.
    pub fn overlay_lines(&self) -> [String; 3] {
        [
            format!("Reps: {}", self.reps),
            format!("Elbow Angle: {}", self.elbow_angle_degrees.trunc() as i64),
            format!("Form: {}", self.form_label()),
        ]
    }
}

impl fmt::Display for FrameMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reps: {}", self.reps)?;
        writeln!(f, "Form Accuracy: {:.2}%", self.form_accuracy_percent)?;
        writeln!(f, "Current Form: {}", self.form_label())?;
        write!(f, "Elbow Angle: {:.2}°", self.elbow_angle_degrees)
    }
}

/// What a session leaves behind once it stops pulling frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub reps: u32,
    pub correct_form_frames: u64,
    pub total_frames: u64,
    /// Frames without a usable detection; never part of `total_frames`.
    pub skipped_frames: u64,
    pub form_accuracy_percent: f64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Reps: {}", self.reps)?;
        write!(f, "Overall Form Accuracy: {:.2}%", self.form_accuracy_percent)
    }
}
