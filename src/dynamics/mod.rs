pub mod airframe;
pub mod atmosphere;
pub mod fixed_wing;
pub mod state;

pub use airframe::Airframe;
pub use fixed_wing::FixedWingDynamics;
pub use state::{ControlCommand, VehicleState};

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::Result;

/// Vehicle dynamics integrator driven by the horizon loop.
///
/// The setters inject state directly and are only used to place the
/// vehicle on the recorded trajectory before the first solve.
pub trait Dynamics {
    fn set_position(&mut self, position: Vector3<f64>);
    fn set_velocity(&mut self, velocity: Vector3<f64>);
    fn set_attitude(&mut self, attitude: UnitQuaternion<f64>);
    fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>);

    /// Advance the vehicle by `dt` seconds holding `control` constant.
    fn integrate(&mut self, dt: f64, control: &ControlCommand) -> Result<()>;

    fn state(&self) -> VehicleState;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
