pub mod exercise;
pub mod frame;
pub mod landmark;
pub mod metrics;

pub use exercise::{ExerciseVariant, Thresholds};
pub use frame::Frame;
pub use landmark::{ArmSide, JointTriplet, Landmark, PoseLandmarks};
pub use metrics::{FrameMetrics, SessionSummary};
