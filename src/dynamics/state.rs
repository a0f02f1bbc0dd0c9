use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::attitude;
use crate::reference::{Sample, StateVector};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665;

// ---------------------------------------------------------------------------
// Vehicle state: position, velocity, attitude, angular rate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub position: Vector3<f64>,          // m, NED
    pub velocity: Vector3<f64>,          // m/s, NED
    pub attitude: UnitQuaternion<f64>,   // NED→body rotation
    pub angular_velocity: Vector3<f64>,  // rad/s, body frame
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl VehicleState {
    pub fn apply(&self, d: &Deriv, dt: f64) -> VehicleState {
        // Quaternion integration: q_new = normalize(q + dq * dt)
        let q_raw = self.attitude.quaternion() + d.dquat * dt;
        VehicleState {
            position: self.position + d.dpos * dt,
            velocity: self.velocity + d.dvel * dt,
            attitude: UnitQuaternion::new_normalize(q_raw),
            angular_velocity: self.angular_velocity + d.domega * dt,
        }
    }

    /// Velocity expressed in body axes (no wind).
    pub fn body_velocity(&self) -> Vector3<f64> {
        self.attitude * self.velocity
    }

    /// Flat 13-component layout shared with the reference samples.
    pub fn state_vector(&self) -> StateVector {
        let q = self.attitude.quaternion();
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            q.i,
            q.j,
            q.k,
            q.w,
            self.angular_velocity.x,
            self.angular_velocity.y,
            self.angular_velocity.z,
        ]
    }

    /// Inverse of [`state_vector`](Self::state_vector). The attitude is
    /// renormalised; `None` if it has zero norm.
    pub fn from_state_vector(v: &StateVector) -> Option<Self> {
        Some(Self {
            position: Vector3::new(v[0], v[1], v[2]),
            velocity: Vector3::new(v[3], v[4], v[5]),
            attitude: attitude::from_xyzw(v[6], v[7], v[8], v[9])?,
            angular_velocity: Vector3::new(v[10], v[11], v[12]),
        })
    }

    pub fn is_finite(&self) -> bool {
        self.state_vector().iter().all(|v| v.is_finite())
    }
}

impl From<&Sample> for VehicleState {
    fn from(s: &Sample) -> Self {
        Self {
            position: s.position,
            velocity: s.velocity,
            attitude: s.attitude,
            angular_velocity: s.angular_velocity,
        }
    }
}

// ---------------------------------------------------------------------------
// State derivative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dquat: Quaternion<f64>,   // not unit: raw quaternion derivative
    pub domega: Vector3<f64>,     // angular acceleration, body frame
}

// ---------------------------------------------------------------------------
// Control command
// ---------------------------------------------------------------------------

pub const CONTROL_DIM: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlCommand {
    pub throttle: f64,       // motor speed, rpm
    pub left_elevon: f64,    // normalised deflection, -1..1
    pub right_elevon: f64,   // normalised deflection, -1..1
}

impl ControlCommand {
    pub fn from_array(a: [f64; CONTROL_DIM]) -> Self {
        Self { throttle: a[0], left_elevon: a[1], right_elevon: a[2] }
    }

    pub fn to_array(self) -> [f64; CONTROL_DIM] {
        [self.throttle, self.left_elevon, self.right_elevon]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}
