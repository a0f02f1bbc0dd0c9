use tracing::warn;

use super::sample::{Sample, Trajectory};
use crate::attitude;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Piecewise-linear resampling
// ---------------------------------------------------------------------------

/// Sample the trajectory at time `t`.
///
/// - `t` at or past the last sample returns the last sample unchanged.
/// - `t` before the first sample returns the first sample unchanged.
/// - Otherwise every component is blended linearly between the bracketing
///   samples, the quaternion component-wise, and the blended quaternion is
///   renormalised. For closely spaced samples this tracks slerp closely.
pub fn interpolate(t: f64, trajectory: &Trajectory) -> Result<Sample> {
    let samples = trajectory.samples();
    // First sample strictly after t.
    let index = samples.partition_point(|s| s.time <= t);

    if index >= samples.len() {
        return Ok(trajectory.last().clone());
    }
    if index == 0 {
        warn!(t, first = trajectory.first().time, "query precedes trajectory, clamping to first sample");
        return Ok(trajectory.first().clone());
    }

    let prev = &samples[index - 1];
    let next = &samples[index];
    let span = next.time - prev.time;
    if span <= 0.0 || span.is_nan() {
        return Err(Error::DegenerateInterpolation {
            time: t,
            reason: format!("bracketing samples share timestamp {}", prev.time),
        });
    }
    let frac = (t - prev.time) / span;

    let q_prev = *prev.attitude.quaternion();
    let q_next = *next.attitude.quaternion();
    let blended = q_prev + (q_next - q_prev) * frac;
    let attitude = attitude::renormalize(blended).ok_or_else(|| Error::DegenerateInterpolation {
        time: t,
        reason: "blended attitude quaternion has zero norm".into(),
    })?;

    Ok(Sample {
        time: prev.time + frac * span,
        position: prev.position + (next.position - prev.position) * frac,
        velocity: prev.velocity + (next.velocity - prev.velocity) * frac,
        attitude,
        angular_velocity: prev.angular_velocity
            + (next.angular_velocity - prev.angular_velocity) * frac,
    })
}

impl Trajectory {
    /// Convenience for [`interpolate`].
    pub fn at(&self, t: f64) -> Result<Sample> {
        interpolate(t, self)
    }
}
