//! Capabilities the engine consumes: pose landmarks and form verdicts.
//!
//! Both are external collaborators. Concrete models live behind these traits
//! so the rep state machine can run against anything from a live estimator
//! to a recorded trace.

pub mod features;
pub mod logistic;
pub mod trace;

use std::sync::Arc;

use anyhow::Result;

use crate::models::{Frame, PoseLandmarks};

pub use features::{extract_features, DEFAULT_FEATURE_LEN};
pub use logistic::LogisticClassifier;
pub use trace::{LandmarkTrace, TracePoseSource};

/// Produces zero or one skeleton per frame.
pub trait PoseSource {
    /// `Ok(None)` means nothing was detected; the engine skips the frame.
    fn detect(&mut self, frame: &Frame) -> Result<Option<PoseLandmarks>>;
}

impl<P: PoseSource + ?Sized> PoseSource for Box<P> {
    fn detect(&mut self, frame: &Frame) -> Result<Option<PoseLandmarks>> {
        (**self).detect(frame)
    }
}

/// Scores a fixed-length feature vector; higher means better form.
pub trait FormClassifier: Send + Sync {
    /// Probability in `[0, 1]` that the posture is correct.
    fn predict(&self, features: &[f32]) -> Result<f32>;

    /// Expected feature-vector length, when the model knows it.
    fn input_len(&self) -> Option<usize> {
        None
    }
}

/// Loaded once and shared read-only by every session.
pub type SharedClassifier = Arc<dyn FormClassifier>;
