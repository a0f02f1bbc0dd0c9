use crate::dynamics::state::{ControlCommand, CONTROL_DIM};
use crate::error::{Error, Result};
use crate::reference::{ReferencePoint, StateVector};

/// Dimension of the state-error vector the weights apply to: position,
/// velocity, attitude (as a rotation vector) and angular velocity.
pub const ERROR_DIM: usize = 12;

// ---------------------------------------------------------------------------
// Solver configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub state_weights: [f64; ERROR_DIM],
    pub control_weights: [f64; CONTROL_DIM],
    pub terminal_weights: [f64; ERROR_DIM],
    pub lower_control_bound: [f64; CONTROL_DIM],
    pub upper_control_bound: [f64; CONTROL_DIM],
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            state_weights: [
                1e-1, 1e-1, 1e-1, // position
                1.0, 1.0, 1.0,    // velocity
                1e1, 1e1, 1e1,    // attitude
                1e1, 1e1, 1e1,    // angular velocity
            ],
            control_weights: [1e-10, 1e-2, 1e-2],
            terminal_weights: [1.0; ERROR_DIM],
            lower_control_bound: [0.0, -1.0, -1.0],
            upper_control_bound: [25_000.0, 1.0, 1.0],
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        let mut weights = self
            .state_weights
            .iter()
            .chain(&self.control_weights)
            .chain(&self.terminal_weights);
        if weights.any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Solver("weights must be finite and non-negative".into()));
        }
        for i in 0..CONTROL_DIM {
            let (lo, hi) = (self.lower_control_bound[i], self.upper_control_bound[i]);
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(Error::Solver(format!(
                    "control {i}: lower bound {lo} exceeds upper bound {hi}"
                )));
            }
        }
        Ok(())
    }

    /// Clamp each control channel into its bounds.
    pub fn clamp(&self, cmd: ControlCommand) -> ControlCommand {
        let mut a = cmd.to_array();
        for (i, v) in a.iter_mut().enumerate() {
            *v = v.clamp(self.lower_control_bound[i], self.upper_control_bound[i]);
        }
        ControlCommand::from_array(a)
    }
}

// ---------------------------------------------------------------------------
// Solver capability
// ---------------------------------------------------------------------------

/// Receding-horizon controller driven by the horizon loop.
///
/// The horizon holds `horizon_length() + 1` reference nodes spaced
/// `step_length()` seconds apart. Each loop step calls `prepare`, then
/// `solve`, then `update_horizon` once the vehicle has been advanced.
/// Implementations may wrap a linked native optimiser or run in process.
pub trait Solver {
    fn configure(&mut self, config: &SolverConfig) -> Result<()>;

    /// Allocate the reference buffer. Requires a prior `configure`.
    fn initialise_horizon(&mut self) -> Result<()>;

    /// Ready internal buffers for the next `solve`.
    fn prepare(&mut self) -> Result<()>;

    /// Control command to apply for the current step.
    fn solve(&mut self, state: &StateVector) -> Result<ControlCommand>;

    fn set_reference(&mut self, index: usize, reference: &ReferencePoint) -> Result<()>;

    /// Slide the horizon forward one step and install `terminal` as the
    /// new last node.
    fn update_horizon(&mut self, terminal: &StateVector) -> Result<()>;

    fn horizon_length(&self) -> usize;

    /// Seconds between horizon nodes.
    fn step_length(&self) -> f64;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
