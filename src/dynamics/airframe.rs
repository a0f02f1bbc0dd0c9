use nalgebra::{Quaternion, Vector3};

use super::atmosphere;
use super::state::{ControlCommand, Deriv, VehicleState, G0};

// ---------------------------------------------------------------------------
// Flying-wing airframe parameters
// ---------------------------------------------------------------------------

/// Rigid flying wing with a single pusher motor and two elevons.
/// Aerodynamic coefficients are per-radian and nondimensional.
#[derive(Debug, Clone)]
pub struct Airframe {
    pub mass: f64,                 // kg
    pub inertia: Vector3<f64>,     // [Ixx, Iyy, Izz] principal moments, kg·m^2
    pub wing_area: f64,            // m^2
    pub span: f64,                 // m
    pub chord: f64,                // m, mean aerodynamic chord
    pub cl0: f64,
    pub cl_alpha: f64,
    pub cd0: f64,
    pub induced_drag: f64,         // k in CD = CD0 + k·CL^2
    pub cy_beta: f64,
    pub cm0: f64,
    pub cm_alpha: f64,
    pub cm_q: f64,
    pub cm_elevon: f64,            // per unit symmetric deflection
    pub cl_elevon: f64,            // rolling moment per unit differential deflection
    pub cl_p: f64,
    pub cn_beta: f64,
    pub cn_r: f64,
    pub thrust_coefficient: f64,   // N / rpm^2
    pub base_altitude: f64,        // m MSL of the NED origin
}

impl Default for Airframe {
    /// ~3.8 kg, 2.1 m span flying wing.
    fn default() -> Self {
        Self {
            mass: 3.8,
            inertia: Vector3::new(1.229, 0.1702, 0.8808),
            wing_area: 0.75,
            span: 2.1,
            chord: 0.357,
            cl0: 0.0,
            cl_alpha: 4.0,
            cd0: 0.02,
            induced_drag: 0.06,
            cy_beta: -0.2,
            cm0: 0.02,
            cm_alpha: -0.4,
            cm_q: -1.3,
            cm_elevon: -0.3,
            cl_elevon: 0.1,
            cl_p: -0.5,
            cn_beta: 0.05,
            cn_r: -0.05,
            thrust_coefficient: 2.5e-8,
            base_altitude: 0.0,
        }
    }
}

impl Airframe {
    /// Static thrust along body +x for a motor speed command.
    pub fn thrust(&self, throttle: f64) -> f64 {
        let rpm = throttle.max(0.0);
        self.thrust_coefficient * rpm * rpm
    }
}

// ---------------------------------------------------------------------------
// Equations of motion
// ---------------------------------------------------------------------------

/// Compute state derivatives for a given state and control command.
///
/// Forces & moments:
///   1. Gravity (NED +z)
///   2. Motor thrust along body +x
///   3. Lift / drag / side force from angle of attack and sideslip
///   4. Elevon pitch and roll moments
///   5. Static pitch and yaw stability, rate damping
pub fn derivatives(state: &VehicleState, airframe: &Airframe, cmd: &ControlCommand) -> Deriv {
    let v_body = state.body_velocity();
    let speed = v_body.norm();
    let omega = state.angular_velocity;

    let f_thrust = Vector3::new(airframe.thrust(cmd.throttle), 0.0, 0.0);

    let (f_aero, torque_body) = if speed > 1.0 {
        let rho = atmosphere::density(airframe.base_altitude - state.position.z);
        let q_dyn = 0.5 * rho * speed * speed;
        let qs = q_dyn * airframe.wing_area;

        let alpha = v_body.z.atan2(v_body.x);
        let beta = (v_body.y / speed).clamp(-1.0, 1.0).asin();

        let cl = airframe.cl0 + airframe.cl_alpha * alpha;
        let cd = airframe.cd0 + airframe.induced_drag * cl * cl;
        let lift = qs * cl;
        let drag = qs * cd;
        let side = qs * airframe.cy_beta * beta;
        let (sa, ca) = alpha.sin_cos();
        let force = Vector3::new(-drag * ca + lift * sa, side, -drag * sa - lift * ca);

        let pitch_cmd = 0.5 * (cmd.left_elevon + cmd.right_elevon);
        let roll_cmd = 0.5 * (cmd.right_elevon - cmd.left_elevon);
        // Rate nondimensionalisation: b/2V, c/2V
        let b_hat = airframe.span / (2.0 * speed);
        let c_hat = airframe.chord / (2.0 * speed);

        let torque = Vector3::new(
            qs * airframe.span * (airframe.cl_elevon * roll_cmd + airframe.cl_p * omega.x * b_hat),
            qs * airframe.chord
                * (airframe.cm0
                    + airframe.cm_alpha * alpha
                    + airframe.cm_elevon * pitch_cmd
                    + airframe.cm_q * omega.y * c_hat),
            qs * airframe.span * (airframe.cn_beta * beta + airframe.cn_r * omega.z * b_hat),
        );
        (force, torque)
    } else {
        (Vector3::zeros(), Vector3::zeros())
    };

    // --- Translational acceleration (NED) ---
    let a_body = (f_thrust + f_aero) / airframe.mass;
    let accel = state.attitude.inverse() * a_body + Vector3::new(0.0, 0.0, G0);

    // --- Euler's equation: I * domega = torque - omega × (I * omega) ---
    let i_vec = airframe.inertia;
    let i_omega = i_vec.component_mul(&omega);
    let domega = (torque_body - omega.cross(&i_omega)).component_div(&i_vec);

    // --- Quaternion kinematics (NED→body): dq/dt = -0.5 * omega_quat * q ---
    let omega_quat = Quaternion::new(0.0, omega.x, omega.y, omega.z);
    let dquat = omega_quat.conjugate() * state.attitude.quaternion() * 0.5;

    Deriv {
        dpos: state.velocity,
        dvel: accel,
        dquat,
        domega,
    }
}
