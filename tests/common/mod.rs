#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use formcoach_lib::inference::{LogisticClassifier, DEFAULT_FEATURE_LEN};
use formcoach_lib::models::landmark::{
    POSE_LANDMARK_COUNT, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST,
};
use formcoach_lib::models::{Landmark, PoseLandmarks};

/// Skeleton whose right elbow is bent to `angle_deg`.
pub fn arm_pose(angle_deg: f64) -> PoseLandmarks {
    let mut landmarks = vec![Landmark::default(); POSE_LANDMARK_COUNT];
    let theta = angle_deg.to_radians();
    landmarks[RIGHT_SHOULDER] = Landmark::new(0.5, 0.3);
    landmarks[RIGHT_ELBOW] = Landmark::new(0.5, 0.5);
    landmarks[RIGHT_WRIST] = Landmark::new(
        (0.5 + 0.2 * theta.sin()) as f32,
        (0.5 - 0.2 * theta.cos()) as f32,
    );
    PoseLandmarks::new(landmarks)
}

/// Writes a JSON Lines trace; `None` entries record frames with no detection.
pub fn write_trace(dir: &Path, angles: &[Option<f64>]) -> PathBuf {
    let path = dir.join("trace.jsonl");
    let body: String = angles
        .iter()
        .map(|angle| {
            let landmarks = angle.map(arm_pose);
            format!("{}\n", serde_json::json!({ "landmarks": landmarks }))
        })
        .collect();
    fs::write(&path, body).unwrap();
    path
}

/// Model that ignores the pose and always answers with `sigmoid(bias)`.
pub fn write_constant_model(dir: &Path, bias: f32) -> PathBuf {
    let path = dir.join("model.json");
    LogisticClassifier::new(vec![0.0; DEFAULT_FEATURE_LEN], bias)
        .unwrap()
        .save(&path)
        .unwrap();
    path
}
