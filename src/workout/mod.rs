pub mod controller;
pub mod state;

pub use controller::{WorkoutController, WorkoutSnapshot};
pub use state::{WorkoutPhase, WorkoutState};
