pub mod workout;

pub use workout::{Workout, WorkoutInfo, WorkoutMode, WorkoutStatus};
