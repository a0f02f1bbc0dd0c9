use nalgebra::{UnitQuaternion, Vector3};

use crate::dynamics::state::VehicleState;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Recorded flight state
// ---------------------------------------------------------------------------

/// One recorded flight-state sample.
/// Frame: NED, origin at the first sample of the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,                       // s, from start of log
    pub position: Vector3<f64>,          // m
    pub velocity: Vector3<f64>,          // m/s
    pub attitude: UnitQuaternion<f64>,   // NED→body
    pub angular_velocity: Vector3<f64>,  // rad/s, body frame
}

impl Sample {
    /// The 13-component state `(p, v, q[x,y,z,w], ω)` the solver consumes.
    pub fn state_vector(&self) -> StateVector {
        VehicleState::from(self).state_vector()
    }
}

pub const STATE_DIM: usize = 13;

/// Flat solver-facing state: position, velocity, attitude (x, y, z, w),
/// angular velocity.
pub type StateVector = [f64; STATE_DIM];

// ---------------------------------------------------------------------------
// Trajectory: time-sorted, immutable sample sequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    /// Wrap samples that are already in ascending time order.
    /// Rejects an empty sequence, non-finite timestamps and any decrease in
    /// timestamp.
    ///
    /// Attitudes are sign-aligned so consecutive quaternions share a
    /// hemisphere (`q` and `-q` are the same rotation); a component-wise
    /// blend across a heading wrap then stays near unit norm.
    pub fn new(mut samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::MalformedInput {
                line: 0,
                reason: "trajectory has no samples".into(),
            });
        }
        if let Some(i) = samples.iter().position(|s| !s.time.is_finite()) {
            return Err(Error::MalformedInput {
                line: i,
                reason: format!("sample time {} is not finite", samples[i].time),
            });
        }
        if let Some(i) = samples.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(Error::MalformedInput {
                line: i + 1,
                reason: format!(
                    "sample time {} goes backwards from {}",
                    samples[i + 1].time, samples[i].time
                ),
            });
        }
        align_hemispheres(&mut samples);
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> &Sample {
        &self.samples[0]
    }

    pub fn last(&self) -> &Sample {
        &self.samples[self.samples.len() - 1]
    }

    /// Covered time span, s.
    pub fn duration(&self) -> f64 {
        self.last().time - self.first().time
    }
}

/// Negate each attitude that points into the opposite hemisphere from its
/// predecessor.
fn align_hemispheres(samples: &mut [Sample]) {
    for i in 1..samples.len() {
        let prev = samples[i - 1].attitude.quaternion().coords;
        let q = samples[i].attitude.into_inner();
        if prev.dot(&q.coords) < 0.0 {
            samples[i].attitude = UnitQuaternion::new_unchecked(-q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: f64) -> Sample {
        Sample {
            time,
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(4.0, 5.0, 6.0),
            attitude: UnitQuaternion::identity(),
            angular_velocity: Vector3::new(0.1, 0.2, 0.3),
        }
    }

    #[test]
    fn state_vector_layout() {
        let v = at(0.0).state_vector();
        assert_eq!(v, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0, 0.0, 0.0, 1.0, 0.1, 0.2, 0.3]);
    }

    #[test]
    fn empty_trajectory_rejected() {
        assert!(matches!(Trajectory::new(vec![]), Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn backwards_time_rejected() {
        let err = Trajectory::new(vec![at(0.0), at(1.0), at(0.5)]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { line: 2, .. }));
    }

    #[test]
    fn non_finite_time_rejected() {
        let err = Trajectory::new(vec![at(f64::NAN), at(1.0)]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { line: 0, .. }));
        assert!(Trajectory::new(vec![at(f64::NAN)]).is_err());
        assert!(Trajectory::new(vec![at(0.0), at(f64::INFINITY)]).is_err());
    }

    #[test]
    fn attitudes_share_a_hemisphere() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3);
        let flipped = UnitQuaternion::new_unchecked(-q.into_inner());
        let traj = Trajectory::new(vec![
            Sample { attitude: q, ..at(0.0) },
            Sample { attitude: flipped, ..at(1.0) },
            Sample { attitude: q, ..at(2.0) },
        ])
        .unwrap();
        let first = traj.first().attitude.quaternion().coords;
        for s in traj.samples() {
            assert_eq!(s.attitude.quaternion().coords, first);
        }
    }

    #[test]
    fn repeated_timestamps_allowed() {
        let traj = Trajectory::new(vec![at(0.0), at(1.0), at(1.0), at(2.0)]).unwrap();
        assert_eq!(traj.len(), 4);
        assert_eq!(traj.duration(), 2.0);
    }
}
