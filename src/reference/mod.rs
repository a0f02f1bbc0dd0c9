pub mod sample;
pub mod resample;
pub mod horizon;

pub use sample::{Sample, StateVector, Trajectory, STATE_DIM};
pub use resample::interpolate;
pub use horizon::{HorizonReference, ReferencePoint};
