use super::sample::{StateVector, Trajectory};
use crate::dynamics::state::ControlCommand;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Horizon reference: HORIZON_LENGTH running points + one terminal point
// ---------------------------------------------------------------------------

/// One horizon node handed to the solver. Running nodes carry a control
/// feedforward; the terminal node does not.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    pub time: f64,
    pub state: StateVector,
    pub feedforward: Option<ControlCommand>,
}

/// Reference window sampled from the trajectory at `start + k * step`,
/// `k = 0..=horizon_length`. Rebuilt from scratch every step.
#[derive(Debug, Clone)]
pub struct HorizonReference {
    points: Vec<ReferencePoint>,
}

impl HorizonReference {
    pub fn build(
        trajectory: &Trajectory,
        start: f64,
        step: f64,
        horizon_length: usize,
        feedforward: ControlCommand,
    ) -> Result<Self> {
        let points = (0..=horizon_length)
            .map(|k| {
                let time = start + k as f64 * step;
                let sample = trajectory.at(time)?;
                Ok(ReferencePoint {
                    time,
                    state: sample.state_vector(),
                    feedforward: (k < horizon_length).then_some(feedforward),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    /// Number of nodes, always `horizon_length + 1`.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nodes that carry a control feedforward.
    pub fn running(&self) -> &[ReferencePoint] {
        &self.points[..self.points.len() - 1]
    }

    pub fn terminal(&self) -> &ReferencePoint {
        &self.points[self.points.len() - 1]
    }
}
