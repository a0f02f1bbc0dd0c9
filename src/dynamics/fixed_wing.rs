use nalgebra::{UnitQuaternion, Vector3};

use super::airframe::Airframe;
use super::state::{ControlCommand, VehicleState};
use super::Dynamics;
use crate::error::{Error, Result};
use crate::sim::integrator::rk4_step;

/// In-process flying-wing model integrated with RK4.
#[derive(Debug, Clone, Default)]
pub struct FixedWingDynamics {
    pub airframe: Airframe,
    state: VehicleState,
}

impl FixedWingDynamics {
    pub fn new(airframe: Airframe) -> Self {
        Self { airframe, state: VehicleState::default() }
    }
}

impl Dynamics for FixedWingDynamics {
    fn set_position(&mut self, position: Vector3<f64>) {
        self.state.position = position;
    }

    fn set_velocity(&mut self, velocity: Vector3<f64>) {
        self.state.velocity = velocity;
    }

    fn set_attitude(&mut self, attitude: UnitQuaternion<f64>) {
        self.state.attitude = attitude;
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>) {
        self.state.angular_velocity = angular_velocity;
    }

    fn integrate(&mut self, dt: f64, control: &ControlCommand) -> Result<()> {
        if dt <= 0.0 || !dt.is_finite() {
            return Err(Error::Dynamics(format!("step length must be positive, got {dt}")));
        }
        if !control.is_finite() {
            return Err(Error::Dynamics(format!("non-finite control {:?}", control.to_array())));
        }
        let next = rk4_step(&self.state, &self.airframe, control, dt);
        if !next.is_finite() {
            return Err(Error::Dynamics("state diverged to a non-finite value".into()));
        }
        self.state = next;
        Ok(())
    }

    fn state(&self) -> VehicleState {
        self.state.clone()
    }

    fn name(&self) -> &str {
        "FixedWingDynamics"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attitude;

    #[test]
    fn setters_inject_state() {
        let mut d = FixedWingDynamics::default();
        let q = attitude::compose(0.4, 0.1, -0.2);
        d.set_position(Vector3::new(1.0, 2.0, -50.0));
        d.set_velocity(Vector3::new(18.0, 3.0, 0.0));
        d.set_attitude(q);
        d.set_angular_velocity(Vector3::new(0.0, 0.1, 0.0));

        let s = d.state();
        assert_eq!(s.position, Vector3::new(1.0, 2.0, -50.0));
        assert_eq!(s.velocity, Vector3::new(18.0, 3.0, 0.0));
        assert_eq!(s.attitude, q);
        assert_eq!(s.angular_velocity, Vector3::new(0.0, 0.1, 0.0));
    }

    #[test]
    fn integrate_moves_the_vehicle() {
        let mut d = FixedWingDynamics::default();
        d.set_position(Vector3::new(0.0, 0.0, -100.0));
        d.set_velocity(Vector3::new(20.0, 0.0, 0.0));
        let cmd = ControlCommand { throttle: 15_000.0, ..Default::default() };
        d.integrate(0.02, &cmd).unwrap();
        assert!((d.state().position.x - 0.4).abs() < 0.01);
    }

    #[test]
    fn rejects_bad_step_and_control() {
        let mut d = FixedWingDynamics::default();
        assert!(matches!(d.integrate(0.0, &ControlCommand::default()), Err(Error::Dynamics(_))));
        let nan = ControlCommand { throttle: f64::NAN, ..Default::default() };
        assert!(matches!(d.integrate(0.02, &nan), Err(Error::Dynamics(_))));
        // Failed calls leave the state untouched.
        assert_eq!(d.state(), VehicleState::default());
    }
}
