pub mod pid;
pub mod solver;
pub mod tracking;

pub use pid::Pid;
pub use solver::{Solver, SolverConfig};
pub use tracking::{TrackingSolver, HORIZON_LENGTH, STEP_LENGTH};
