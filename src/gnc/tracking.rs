use std::collections::VecDeque;

use tracing::trace;

use super::pid::Pid;
use super::solver::{Solver, SolverConfig, ERROR_DIM};
use crate::dynamics::state::{ControlCommand, VehicleState};
use crate::error::{Error, Result};
use crate::reference::{ReferencePoint, StateVector};

pub const HORIZON_LENGTH: usize = 50;
pub const STEP_LENGTH: f64 = 0.02; // s

// ---------------------------------------------------------------------------
// Tracking solver: PID loops on the horizon reference
// ---------------------------------------------------------------------------

/// In-process stand-in for the native optimiser.
///
/// Holds the same reference horizon and follows the same call protocol, but
/// computes the command with PID loops toward the next horizon node instead
/// of solving the QP. Airspeed error drives throttle; roll and pitch error
/// drive differential and symmetric elevon around the node's feedforward.
#[derive(Debug, Clone)]
pub struct TrackingSolver {
    pub speed_pid: Pid,
    pub pitch_pid: Pid,
    pub roll_pid: Pid,
    config: Option<SolverConfig>,
    horizon: VecDeque<Option<ReferencePoint>>,
    horizon_length: usize,
    step_length: f64,
    prepared: bool,
    last_cost: f64,
}

impl TrackingSolver {
    pub fn new() -> Self {
        Self::with_horizon(HORIZON_LENGTH, STEP_LENGTH)
    }

    /// Panics if `horizon_length` is zero or `step_length` is not positive.
    pub fn with_horizon(horizon_length: usize, step_length: f64) -> Self {
        assert!(horizon_length > 0, "horizon needs at least one running node");
        assert!(step_length > 0.0, "step length must be positive");
        Self {
            // Tuned for a ~4 kg flying wing around 20 m/s
            speed_pid: Pid::new(1_500.0, 200.0, 0.0).with_integral_limit(20.0),
            pitch_pid: Pid::new(1.5, 0.3, 0.2),
            roll_pid: Pid::new(1.2, 0.1, 0.15),
            config: None,
            horizon: VecDeque::new(),
            horizon_length,
            step_length,
            prepared: false,
            last_cost: 0.0,
        }
    }

    /// Reference node at `index`, if it has been set.
    pub fn reference(&self, index: usize) -> Option<&ReferencePoint> {
        self.horizon.get(index).and_then(Option::as_ref)
    }

    /// Weighted tracking cost of the last `solve`: stage cost against node 0,
    /// control effort against its feedforward, and a terminal cost for a
    /// constant-velocity extrapolation over the horizon.
    pub fn last_cost(&self) -> f64 {
        self.last_cost
    }

    pub fn reset(&mut self) {
        self.speed_pid.reset();
        self.pitch_pid.reset();
        self.roll_pid.reset();
        self.prepared = false;
    }

    fn node(&self, index: usize) -> Result<&ReferencePoint> {
        self.reference(index)
            .ok_or_else(|| Error::Solver(format!("reference node {index} has not been set")))
    }

    fn config(&self) -> Result<&SolverConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::Solver("solver has not been configured".into()))
    }

    fn ensure_horizon(&self) -> Result<()> {
        if self.horizon.len() != self.horizon_length + 1 {
            return Err(Error::Solver("horizon has not been initialised".into()));
        }
        Ok(())
    }
}

impl Default for TrackingSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// 12-component error `reference - state`: position, velocity, attitude as
/// a body-frame rotation vector, angular velocity.
pub fn tracking_error(state: &VehicleState, reference: &VehicleState) -> [f64; ERROR_DIM] {
    let dp = reference.position - state.position;
    let dv = reference.velocity - state.velocity;
    let datt = (reference.attitude * state.attitude.inverse()).scaled_axis();
    let dw = reference.angular_velocity - state.angular_velocity;
    let mut e = [0.0; ERROR_DIM];
    for (chunk, v) in e.chunks_mut(3).zip([dp, dv, datt, dw]) {
        chunk.copy_from_slice(v.as_slice());
    }
    e
}

fn weighted(error: &[f64], weights: &[f64]) -> f64 {
    error.iter().zip(weights).map(|(e, w)| w * e * e).sum()
}

fn decode(v: &StateVector, what: &str) -> Result<VehicleState> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::Solver(format!("{what} contains a non-finite value")));
    }
    VehicleState::from_state_vector(v)
        .ok_or_else(|| Error::Solver(format!("{what} has a zero-norm attitude")))
}

impl Solver for TrackingSolver {
    fn configure(&mut self, config: &SolverConfig) -> Result<()> {
        config.validate()?;
        self.config = Some(config.clone());
        Ok(())
    }

    fn initialise_horizon(&mut self) -> Result<()> {
        self.config()?;
        self.horizon = std::iter::repeat(None).take(self.horizon_length + 1).collect();
        self.reset();
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        self.ensure_horizon()?;
        self.prepared = true;
        Ok(())
    }

    fn solve(&mut self, state: &StateVector) -> Result<ControlCommand> {
        if !self.prepared {
            return Err(Error::Solver("solve called without prepare".into()));
        }
        self.prepared = false;

        let current = decode(state, "current state")?;
        let node0 = self.node(0)?.clone();
        let target = decode(&self.node(1)?.state, "reference")?;
        let terminal = decode(&self.node(self.horizon_length)?.state, "terminal reference")?;
        let feedforward = node0.feedforward.unwrap_or_default();
        let dt = self.step_length;

        // Roll/pitch error from the body-frame rotation vector. NED→body
        // attitudes compose with negated angles, hence the sign flip.
        let att_err = (target.attitude * current.attitude.inverse()).scaled_axis();
        let roll_err = -att_err.x;
        let pitch_err = -att_err.y;
        let speed_err = target.velocity.norm() - current.velocity.norm();

        let throttle = feedforward.throttle + self.speed_pid.update(speed_err, dt);
        let roll_cmd = self.roll_pid.update(roll_err, dt);
        // Positive symmetric elevon pitches the nose down.
        let pitch_cmd = -self.pitch_pid.update(pitch_err, dt);

        let config = self.config()?.clone();
        let cmd = config.clamp(ControlCommand {
            throttle,
            left_elevon: feedforward.left_elevon + pitch_cmd - roll_cmd,
            right_elevon: feedforward.right_elevon + pitch_cmd + roll_cmd,
        });

        let reference0 = decode(&node0.state, "reference")?;
        let horizon_time = self.horizon_length as f64 * dt;
        let extrapolated = VehicleState {
            position: current.position + current.velocity * horizon_time,
            ..current.clone()
        };
        let effort: Vec<f64> = cmd
            .to_array()
            .iter()
            .zip(feedforward.to_array())
            .map(|(u, f)| u - f)
            .collect();
        self.last_cost = weighted(&tracking_error(&current, &reference0), &config.state_weights)
            + weighted(&effort, &config.control_weights)
            + weighted(&tracking_error(&extrapolated, &terminal), &config.terminal_weights);

        trace!(
            speed_err,
            roll_err,
            pitch_err,
            cost = self.last_cost,
            "tracking solve"
        );
        Ok(cmd)
    }

    fn set_reference(&mut self, index: usize, reference: &ReferencePoint) -> Result<()> {
        self.ensure_horizon()?;
        if index > self.horizon_length {
            return Err(Error::Solver(format!(
                "horizon index {index} out of range 0..={}",
                self.horizon_length
            )));
        }
        decode(&reference.state, "reference")?;
        self.horizon[index] = Some(reference.clone());
        Ok(())
    }

    fn update_horizon(&mut self, terminal: &StateVector) -> Result<()> {
        self.ensure_horizon()?;
        decode(terminal, "terminal reference")?;
        let last_running = self.node(self.horizon_length - 1)?.feedforward;
        let old_terminal = self.node(self.horizon_length)?.clone();

        self.horizon.pop_front();
        // Former terminal node becomes the last running node.
        if let Some(Some(node)) = self.horizon.back_mut() {
            node.feedforward = last_running;
        }
        self.horizon.push_back(Some(ReferencePoint {
            time: old_terminal.time + self.step_length,
            state: *terminal,
            feedforward: None,
        }));
        Ok(())
    }

    fn horizon_length(&self) -> usize {
        self.horizon_length
    }

    fn step_length(&self) -> f64 {
        self.step_length
    }

    fn name(&self) -> &str {
        "TrackingSolver"
    }
}
