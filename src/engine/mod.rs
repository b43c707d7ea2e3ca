//! Frame metrics engine: joint angle, rep state machine, form aggregation.

pub mod angle;
pub mod processor;
pub mod rep_state;

pub use angle::compute_joint_angle;
pub use processor::{
    FrameProcessor, FrameReport, FrameTimings, ProcessorConfig, DEFAULT_DECISION_THRESHOLD,
};
pub use rep_state::{aggregate_metrics, update_rep_state, RepState, Stage};
