//! Pose landmarks as delivered by an external pose estimator.
//!
//! Indices follow the MediaPipe Pose topology (33 points).

use serde::{Deserialize, Serialize};

pub const POSE_LANDMARK_COUNT: usize = 33;

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;

/// A single landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth, 0 when the estimator only reports 2D.
    #[serde(default)]
    pub z: f32,
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 1.0,
        }
    }
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Planar position widened to `f64` for angle math.
    pub fn point(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

/// One frame's detection: every landmark of the skeleton, in topology order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks(Vec<Landmark>);

impl PoseLandmarks {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }

    /// Returns the three landmarks of `joints`, or `None` if the detection
    /// does not cover all of them.
    pub fn triplet(&self, joints: &JointTriplet) -> Option<(Landmark, Landmark, Landmark)> {
        Some((
            *self.get(joints.proximal)?,
            *self.get(joints.vertex)?,
            *self.get(joints.distal)?,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ArmSide {
    Left,
    #[default]
    Right,
}

/// Landmark indices of (proximal, vertex, distal); the angle is measured at
/// the vertex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct JointTriplet {
    pub proximal: usize,
    pub vertex: usize,
    pub distal: usize,
}

impl JointTriplet {
    pub const RIGHT_ELBOW: Self = Self {
        proximal: RIGHT_SHOULDER,
        vertex: RIGHT_ELBOW,
        distal: RIGHT_WRIST,
    };

    pub const LEFT_ELBOW: Self = Self {
        proximal: LEFT_SHOULDER,
        vertex: LEFT_ELBOW,
        distal: LEFT_WRIST,
    };

    pub fn elbow(side: ArmSide) -> Self {
        match side {
            ArmSide::Left => Self::LEFT_ELBOW,
            ArmSide::Right => Self::RIGHT_ELBOW,
        }
    }
}
