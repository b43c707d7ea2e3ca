use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::inference::{extract_features, PoseSource, SharedClassifier, DEFAULT_FEATURE_LEN};
use crate::models::{ExerciseVariant, Frame, FrameMetrics, JointTriplet, SessionSummary, Thresholds};

use super::angle::compute_joint_angle;
use super::rep_state::{aggregate_metrics, update_rep_state, RepState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Classifier probabilities strictly above this count as correct form.
pub const DEFAULT_DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfig {
    pub variant: ExerciseVariant,
    pub thresholds: Thresholds,
    pub joints: JointTriplet,
    pub decision_threshold: f32,
    pub feature_len: usize,
}

impl ProcessorConfig {
    pub fn for_variant(variant: ExerciseVariant) -> Self {
        Self {
            variant,
            thresholds: variant.default_thresholds(),
            joints: JointTriplet::RIGHT_ELBOW,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            feature_len: DEFAULT_FEATURE_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTimings {
    pub pose_ms: u64,
    /// `None` when the frame was skipped before classification.
    pub classify_ms: Option<u64>,
    pub total_ms: u64,
}

/// Outcome of one frame. `metrics` is `None` for skipped frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub metrics: Option<FrameMetrics>,
    pub timings: FrameTimings,
    /// Session counters after this frame.
    pub progress: SessionSummary,
}

/// Runs the per-frame pipeline for one session and owns its rep state.
pub struct FrameProcessor<P> {
    config: ProcessorConfig,
    pose: P,
    classifier: SharedClassifier,
    state: RepState,
    skipped_frames: u64,
}

impl<P: PoseSource> FrameProcessor<P> {
    pub fn new(config: ProcessorConfig, pose: P, classifier: SharedClassifier) -> Result<Self> {
        config.thresholds.validate()?;

        if !(0.0..=1.0).contains(&config.decision_threshold) {
            bail!(
                "decision threshold {} must lie in [0, 1]",
                config.decision_threshold
            );
        }
        if let Some(expected) = classifier.input_len() {
            if expected != config.feature_len {
                bail!(crate::error::CoachError::InvalidModel(format!(
                    "model expects {expected} features, session is configured for {}",
                    config.feature_len
                )));
            }
        }

        log_info!(
            "frame processor ready: {} (extended > {}°, contracted < {}°)",
            config.variant,
            config.thresholds.extended,
            config.thresholds.contracted
        );

        Ok(Self {
            config,
            pose,
            classifier,
            state: RepState::new(),
            skipped_frames: 0,
        })
    }

    /// Processes one frame.
    ///
    /// Frames without a usable detection are skipped: rep state is left
    /// untouched and the report carries no metrics. Every fallible step runs
    /// before the state is updated, so an error never leaves a half-counted
    /// frame behind.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        let started = Instant::now();

        let detection = self
            .pose
            .detect(frame)
            .with_context(|| format!("pose detection failed on frame {}", frame.index))?;
        let pose_ms = started.elapsed().as_millis() as u64;

        let joints = detection
            .as_ref()
            .and_then(|landmarks| landmarks.triplet(&self.config.joints).map(|t| (landmarks, t)));

        let Some((landmarks, (proximal, vertex, distal))) = joints else {
            self.skipped_frames += 1;
            log_debug!("frame {} skipped: no usable pose", frame.index);
            return Ok(FrameReport {
                metrics: None,
                timings: FrameTimings {
                    pose_ms,
                    classify_ms: None,
                    total_ms: started.elapsed().as_millis() as u64,
                },
                progress: self.summary(),
            });
        };

        let features = extract_features(landmarks, self.config.feature_len);
        let classify_start = Instant::now();
        let probability = self
            .classifier
            .predict(&features)
            .with_context(|| format!("form classification failed on frame {}", frame.index))?;
        let classify_ms = classify_start.elapsed().as_millis() as u64;
        let correct_form = probability > self.config.decision_threshold;

        let elbow_angle = compute_joint_angle(proximal.point(), vertex.point(), distal.point());

        update_rep_state(&mut self.state, elbow_angle, correct_form, &self.config.thresholds);
        let metrics = aggregate_metrics(&mut self.state, elbow_angle, correct_form);

        log_debug!(
            "frame {}: angle={:.1} p={:.3} reps={}",
            frame.index,
            elbow_angle,
            probability,
            metrics.reps
        );

        Ok(FrameReport {
            metrics: Some(metrics),
            timings: FrameTimings {
                pose_ms,
                classify_ms: Some(classify_ms),
                total_ms: started.elapsed().as_millis() as u64,
            },
            progress: self.summary(),
        })
    }
}

impl<P> FrameProcessor<P> {
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn state(&self) -> &RepState {
        &self.state
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            reps: self.state.reps(),
            correct_form_frames: self.state.correct_form_count(),
            total_frames: self.state.total_frames(),
            skipped_frames: self.skipped_frames,
            form_accuracy_percent: self.state.form_accuracy_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{arm_pose, ConstantClassifier, ScriptedPose};
    use crate::engine::Stage;
    use crate::inference::LogisticClassifier;
    use crate::models::{ArmSide, Landmark, PoseLandmarks};
    use std::sync::Arc;

    fn processor(script: Vec<Option<PoseLandmarks>>, p: f32) -> FrameProcessor<ScriptedPose> {
        FrameProcessor::new(
            ProcessorConfig::for_variant(ExerciseVariant::BicepCurl),
            ScriptedPose::new(script),
            Arc::new(ConstantClassifier(p)),
        )
        .unwrap()
    }

    fn run_all<P: PoseSource>(processor: &mut FrameProcessor<P>, frames: u64) -> Vec<FrameReport> {
        (0..frames)
            .map(|i| processor.process_frame(&Frame::placeholder(i)).unwrap())
            .collect()
    }

    #[test]
    fn counts_a_curl() {
        let script = vec![Some(arm_pose(150.0)), Some(arm_pose(50.0)), Some(arm_pose(50.0))];
        let mut processor = processor(script, 0.9);
        let reports = run_all(&mut processor, 3);

        let reps: Vec<u32> = reports.iter().map(|r| r.metrics.unwrap().reps).collect();
        assert_eq!(reps, vec![0, 1, 1]);
        let angle = reports[0].metrics.unwrap().elbow_angle_degrees;
        assert!((angle - 150.0).abs() < 1e-3, "{angle}");
        assert_eq!(processor.state().stage(), Some(Stage::Up));
    }

    #[test]
    fn poor_form_never_counts() {
        let script = vec![Some(arm_pose(150.0)), Some(arm_pose(50.0))];
        let mut processor = processor(script, 0.2);
        let reports = run_all(&mut processor, 2);

        let last = reports[1].metrics.unwrap();
        assert_eq!(last.reps, 0);
        assert!(!last.correct_form);
        assert_eq!(last.form_accuracy_percent, 0.0);
    }

    #[test]
    fn probability_at_threshold_is_incorrect() {
        let mut processor = processor(vec![Some(arm_pose(90.0))], 0.5);
        let report = processor.process_frame(&Frame::placeholder(0)).unwrap();
        assert!(!report.metrics.unwrap().correct_form);
    }

    #[test]
    fn skips_frames_without_detection() {
        let script = vec![Some(arm_pose(150.0)), None, Some(arm_pose(50.0))];
        let mut processor = processor(script, 0.9);

        processor.process_frame(&Frame::placeholder(0)).unwrap();
        let before = processor.state().clone();

        let skipped = processor.process_frame(&Frame::placeholder(1)).unwrap();
        assert!(skipped.metrics.is_none());
        assert!(skipped.timings.classify_ms.is_none());
        assert_eq!(processor.state(), &before);

        let report = processor.process_frame(&Frame::placeholder(2)).unwrap();
        assert_eq!(report.metrics.unwrap().reps, 1);

        let summary = processor.summary();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.skipped_frames, 1);
        assert_eq!(summary.reps, 1);
    }

    #[test]
    fn detection_missing_the_arm_is_skipped() {
        let partial = PoseLandmarks::new(vec![Landmark::default(); 5]);
        let mut processor = processor(vec![Some(partial)], 0.9);
        let report = processor.process_frame(&Frame::placeholder(0)).unwrap();
        assert!(report.metrics.is_none());
        assert_eq!(processor.state().total_frames(), 0);
    }

    #[test]
    fn left_arm_reads_left_landmarks() {
        let mut config = ProcessorConfig::for_variant(ExerciseVariant::BicepCurl);
        config.joints = JointTriplet::elbow(ArmSide::Left);
        let mut processor = FrameProcessor::new(
            config,
            ScriptedPose::new(vec![Some(arm_pose(150.0))]),
            Arc::new(ConstantClassifier(0.9)),
        )
        .unwrap();
        let report = processor.process_frame(&Frame::placeholder(0)).unwrap();
        // arm_pose only bends the right arm; the left one is a degenerate
        // stack of identical points.
        let angle = report.metrics.unwrap().elbow_angle_degrees;
        assert!((angle - 150.0).abs() > 1.0);
    }

    #[test]
    fn classifier_failure_leaves_state_untouched() {
        let model = LogisticClassifier::new(vec![1.0; 8], 0.0).unwrap();
        let mut config = ProcessorConfig::for_variant(ExerciseVariant::BicepCurl);
        config.feature_len = 8;
        let mut processor =
            FrameProcessor::new(config, ScriptedPose::new(vec![Some(arm_pose(150.0))]), Arc::new(model))
                .unwrap();
        processor.process_frame(&Frame::placeholder(0)).unwrap();
        assert_eq!(processor.state().total_frames(), 1);

        struct Failing;
        impl crate::inference::FormClassifier for Failing {
            fn predict(&self, _features: &[f32]) -> Result<f32> {
                anyhow::bail!("model crashed")
            }
        }
        let mut failing = FrameProcessor::new(
            ProcessorConfig::for_variant(ExerciseVariant::BicepCurl),
            ScriptedPose::new(vec![Some(arm_pose(150.0))]),
            Arc::new(Failing),
        )
        .unwrap();
        assert!(failing.process_frame(&Frame::placeholder(0)).is_err());
        assert_eq!(failing.state(), &RepState::new());
    }

    #[test]
    fn rejects_mismatched_model() {
        let model = LogisticClassifier::new(vec![1.0; 12], 0.0).unwrap();
        let result = FrameProcessor::new(
            ProcessorConfig::for_variant(ExerciseVariant::HammerCurl),
            ScriptedPose::new(Vec::new()),
            Arc::new(model),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_invalid_thresholds() {
        let mut config = ProcessorConfig::for_variant(ExerciseVariant::BicepCurl);
        config.thresholds = Thresholds {
            extended: 40.0,
            contracted: 90.0,
        };
        let result = FrameProcessor::new(
            config,
            ScriptedPose::new(Vec::new()),
            Arc::new(ConstantClassifier(0.9)),
        );
        assert!(result.is_err());
    }
}
