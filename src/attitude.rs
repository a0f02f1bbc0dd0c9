use nalgebra::{Quaternion, UnitQuaternion, Vector3, Vector4};

// ---------------------------------------------------------------------------
// Euler composition (heading / pitch / roll)
// ---------------------------------------------------------------------------

/// Build the NED→body attitude quaternion from heading, pitch and roll (rad).
///
/// Rotations are negated and multiplied left to right as roll (X), pitch (Y),
/// yaw (Z). Reference logs were produced with exactly this ordering, so it
/// must not be rearranged.
pub fn compose(yaw: f64, pitch: f64, roll: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -roll)
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -pitch)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -yaw)
}

/// Divide a blended quaternion by its norm. `None` when the norm is zero.
pub fn renormalize(q: Quaternion<f64>) -> Option<UnitQuaternion<f64>> {
    UnitQuaternion::try_new(q, f64::EPSILON)
}

/// Quaternion components in `(x, y, z, w)` order.
pub fn xyzw(q: &UnitQuaternion<f64>) -> Vector4<f64> {
    q.quaternion().coords
}

/// Unit quaternion from `(x, y, z, w)` components, renormalised.
pub fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Option<UnitQuaternion<f64>> {
    renormalize(Quaternion::new(w, x, y, z))
}
