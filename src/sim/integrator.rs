use nalgebra::UnitQuaternion;

use crate::dynamics::airframe::{self, Airframe};
use crate::dynamics::state::{ControlCommand, VehicleState};

// ---------------------------------------------------------------------------
// RK4 integrator with constant control over the step
// ---------------------------------------------------------------------------

/// Single RK4 step with the control command held over the step.
pub fn rk4_step(
    state: &VehicleState,
    airframe: &Airframe,
    cmd: &ControlCommand,
    dt: f64,
) -> VehicleState {
    let k1 = airframe::derivatives(state, airframe, cmd);
    let k2 = airframe::derivatives(&state.apply(&k1, dt * 0.5), airframe, cmd);
    let k3 = airframe::derivatives(&state.apply(&k2, dt * 0.5), airframe, cmd);
    let k4 = airframe::derivatives(&state.apply(&k3, dt), airframe, cmd);

    let new_quat_raw = state.attitude.quaternion()
        + (k1.dquat + k2.dquat * 2.0 + k3.dquat * 2.0 + k4.dquat) * (dt / 6.0);

    VehicleState {
        position: state.position
            + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        velocity: state.velocity
            + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        attitude: UnitQuaternion::new_normalize(new_quat_raw),
        angular_velocity: state.angular_velocity
            + (k1.domega + 2.0 * k2.domega + 2.0 * k3.domega + k4.domega) * (dt / 6.0),
    }
}
