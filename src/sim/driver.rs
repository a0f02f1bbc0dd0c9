use std::io::Write;

use tracing::{debug, info};

use crate::dynamics::state::{ControlCommand, VehicleState};
use crate::dynamics::{Dynamics, FixedWingDynamics};
use crate::error::Result;
use crate::gnc::{Solver, SolverConfig, TrackingSolver};
use crate::io::telemetry;
use crate::reference::{HorizonReference, Trajectory};

// ---------------------------------------------------------------------------
// Driver configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverConfig {
    pub steps: usize,
    /// Control feedforward attached to every running horizon node.
    pub feedforward: ControlCommand,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            steps: 500,
            // Cruise motor speed, elevons neutral
            feedforward: ControlCommand { throttle: 15_000.0, left_elevon: 0.0, right_elevon: 0.0 },
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    pub final_time: f64,
    pub final_state: VehicleState,
}

// ---------------------------------------------------------------------------
// Simulation context: trajectory, collaborators and the live horizon
// ---------------------------------------------------------------------------

/// Closed loop between a recorded trajectory, a receding-horizon solver and
/// a vehicle model. Owns everything one run touches.
pub struct Simulation<S: Solver, D: Dynamics> {
    trajectory: Trajectory,
    solver: S,
    dynamics: D,
    horizon: HorizonReference,
    config: DriverConfig,
    step: usize,
}

impl<S: Solver, D: Dynamics> Simulation<S, D> {
    /// Configure the solver, seed its horizon from `0..=H*step` and place
    /// the vehicle on the trajectory's first sample.
    pub fn new(
        trajectory: Trajectory,
        mut solver: S,
        mut dynamics: D,
        solver_config: &SolverConfig,
        config: DriverConfig,
    ) -> Result<Self> {
        solver.configure(solver_config)?;
        solver.initialise_horizon()?;

        let horizon = HorizonReference::build(
            &trajectory,
            0.0,
            solver.step_length(),
            solver.horizon_length(),
            config.feedforward,
        )?;
        for (k, point) in horizon.points().iter().enumerate() {
            solver.set_reference(k, point)?;
        }

        let start = trajectory.at(0.0)?;
        dynamics.set_position(start.position);
        dynamics.set_velocity(start.velocity);
        dynamics.set_attitude(start.attitude);
        dynamics.set_angular_velocity(start.angular_velocity);

        info!(
            solver = solver.name(),
            dynamics = dynamics.name(),
            horizon = solver.horizon_length(),
            step = solver.step_length(),
            samples = trajectory.len(),
            "horizon seeded"
        );

        Ok(Self { trajectory, solver, dynamics, horizon, config, step: 0 })
    }

    /// Run one prepare → solve → integrate → shift cycle and write the
    /// telemetry row for the state the solve started from.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<ControlCommand> {
        let i = self.step;
        let cmd = self.advance(out).map_err(|e| e.at_step(i))?;
        self.step += 1;
        Ok(cmd)
    }

    fn advance<W: Write>(&mut self, out: &mut W) -> Result<ControlCommand> {
        let dt = self.solver.step_length();
        let h = self.solver.horizon_length();
        let time = self.step as f64 * dt;

        self.solver.prepare()?;
        let state = self.dynamics.state();
        let cmd = self.solver.solve(&state.state_vector())?;
        telemetry::write_row(out, time, &state)?;

        self.dynamics.integrate(dt, &cmd)?;
        debug!(
            step = self.step,
            t = time,
            throttle = cmd.throttle,
            left = cmd.left_elevon,
            right = cmd.right_elevon,
            "control applied"
        );

        // Window now starts at the vehicle's new time. The solver shifts its
        // own buffer and only takes the new terminal node; the full window
        // is kept for `horizon()`.
        let start = (self.step + 1) as f64 * dt;
        self.horizon =
            HorizonReference::build(&self.trajectory, start, dt, h, self.config.feedforward)?;
        debug_assert_eq!(self.horizon.len(), h + 1);
        self.solver.update_horizon(&self.horizon.terminal().state)?;

        Ok(cmd)
    }

    /// Run the configured number of steps, writing one telemetry row each.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<RunSummary> {
        for _ in 0..self.config.steps {
            self.step(out)?;
        }
        let summary = RunSummary {
            steps: self.step,
            final_time: self.step as f64 * self.solver.step_length(),
            final_state: self.dynamics.state(),
        };
        info!(steps = summary.steps, t = summary.final_time, "run complete");
        Ok(summary)
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn dynamics(&self) -> &D {
        &self.dynamics
    }

    /// Reference window for the vehicle's current time, rebuilt in full
    /// every step. Its terminal node is the one last pushed to the solver.
    pub fn horizon(&self) -> &HorizonReference {
        &self.horizon
    }

    /// Number of completed steps.
    pub fn steps_done(&self) -> usize {
        self.step
    }
}

/// Replay `trajectory` with the in-process tracking solver and flying-wing
/// model (convenience wrapper).
pub fn simulate<W: Write>(
    trajectory: Trajectory,
    config: DriverConfig,
    out: &mut W,
) -> Result<RunSummary> {
    let mut sim = Simulation::new(
        trajectory,
        TrackingSolver::new(),
        FixedWingDynamics::default(),
        &SolverConfig::default(),
        config,
    )?;
    sim.run(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attitude;
    use crate::error::Error;
    use crate::reference::{ReferencePoint, Sample, StateVector};
    use nalgebra::{UnitQuaternion, Vector3};

    fn level_flight(duration: f64) -> Trajectory {
        let n = (duration / 0.1) as usize;
        Trajectory::new(
            (0..=n)
                .map(|i| {
                    let t = i as f64 * 0.1;
                    Sample {
                        time: t,
                        position: Vector3::new(20.0 * t, 0.0, -100.0),
                        velocity: Vector3::new(20.0, 0.0, 0.0),
                        attitude: UnitQuaternion::identity(),
                        angular_velocity: Vector3::zeros(),
                    }
                })
                .collect(),
        )
        .unwrap()
    }

    /// Records the call protocol and returns the feedforward of node 0.
    #[derive(Default)]
    struct RecordingSolver {
        calls: Vec<&'static str>,
        horizon: Vec<Option<ReferencePoint>>,
        terminals: Vec<StateVector>,
        prepared: bool,
        fail_at: Option<usize>,
        solves: usize,
    }

    impl Solver for RecordingSolver {
        fn configure(&mut self, _config: &SolverConfig) -> Result<()> {
            self.calls.push("configure");
            Ok(())
        }

        fn initialise_horizon(&mut self) -> Result<()> {
            self.calls.push("initialise_horizon");
            self.horizon = vec![None; self.horizon_length() + 1];
            Ok(())
        }

        fn prepare(&mut self) -> Result<()> {
            self.calls.push("prepare");
            self.prepared = true;
            Ok(())
        }

        fn solve(&mut self, _state: &StateVector) -> Result<ControlCommand> {
            self.calls.push("solve");
            assert!(self.prepared, "solve without prepare");
            self.prepared = false;
            if self.fail_at == Some(self.solves) {
                return Err(Error::Solver("did not converge".into()));
            }
            self.solves += 1;
            Ok(self.horizon[0].as_ref().and_then(|p| p.feedforward).unwrap_or_default())
        }

        fn set_reference(&mut self, index: usize, reference: &ReferencePoint) -> Result<()> {
            self.calls.push("set_reference");
            self.horizon[index] = Some(reference.clone());
            Ok(())
        }

        fn update_horizon(&mut self, terminal: &StateVector) -> Result<()> {
            self.calls.push("update_horizon");
            self.terminals.push(*terminal);
            Ok(())
        }

        fn horizon_length(&self) -> usize {
            5
        }

        fn step_length(&self) -> f64 {
            0.1
        }
    }

    /// Moves along +x at the injected velocity.
    #[derive(Default)]
    struct KinematicDynamics {
        state: VehicleState,
        controls: Vec<ControlCommand>,
    }

    impl Dynamics for KinematicDynamics {
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
            self.controls.push(*control);
            self.state.position += self.state.velocity * dt;
            Ok(())
        }
        fn state(&self) -> VehicleState {
            self.state.clone()
        }
    }

    fn recording_sim(steps: usize) -> Simulation<RecordingSolver, KinematicDynamics> {
        Simulation::new(
            level_flight(10.0),
            RecordingSolver::default(),
            KinematicDynamics::default(),
            &SolverConfig::default(),
            DriverConfig { steps, ..DriverConfig::default() },
        )
        .unwrap()
    }

    #[test]
    fn initialisation_seeds_every_node_and_the_vehicle() {
        let sim = recording_sim(0);
        let solver = sim.solver();
        assert_eq!(&solver.calls[..2], &["configure", "initialise_horizon"]);
        assert_eq!(solver.calls.iter().filter(|c| **c == "set_reference").count(), 6);
        assert!(solver.horizon.iter().all(Option::is_some));
        assert!(solver.horizon[5].as_ref().unwrap().feedforward.is_none());

        let start = sim.trajectory().first();
        assert_eq!(sim.dynamics().state(), VehicleState::from(start));
    }

    #[test]
    fn each_step_follows_the_call_order() {
        let mut sim = recording_sim(3);
        let mut out = Vec::new();
        sim.run(&mut out).unwrap();
        let loop_calls: Vec<&str> = sim
            .solver()
            .calls
            .iter()
            .copied()
            .filter(|c| !matches!(*c, "configure" | "initialise_horizon" | "set_reference"))
            .collect();
        assert_eq!(loop_calls, ["prepare", "solve", "update_horizon"].repeat(3));
        assert_eq!(sim.dynamics().controls, vec![DriverConfig::default().feedforward; 3]);
    }

    #[test]
    fn terminal_pushed_for_the_shifted_window() {
        let mut sim = recording_sim(2);
        sim.run(&mut Vec::new()).unwrap();
        // After step i the window starts at (i+1)*0.1; terminal at (i+1+5)*0.1.
        let terminals = &sim.solver().terminals;
        assert!((terminals[0][0] - 20.0 * 0.6).abs() < 1e-9);
        assert!((terminals[1][0] - 20.0 * 0.7).abs() < 1e-9);
        assert!((sim.horizon().points()[0].time - 0.2).abs() < 1e-12);
    }

    #[test]
    fn rebuilt_window_matches_solver_side_shift() {
        let mut sim = Simulation::new(
            level_flight(10.0),
            TrackingSolver::with_horizon(5, 0.1),
            KinematicDynamics::default(),
            &SolverConfig::default(),
            DriverConfig::default(),
        )
        .unwrap();
        let mut out = Vec::new();
        for _ in 0..4 {
            sim.step(&mut out).unwrap();
            let window = sim.horizon().points();
            for (k, point) in window.iter().enumerate() {
                let held = sim.solver().reference(k).unwrap();
                assert!((held.time - point.time).abs() < 1e-9, "node {k}");
                assert_eq!(held.feedforward, point.feedforward, "node {k}");
                for (a, b) in held.state.iter().zip(point.state) {
                    assert!((a - b).abs() < 1e-9, "node {k}");
                }
            }
        }
    }

    #[test]
    fn horizon_length_holds_past_the_end_of_the_log() {
        // 10 s of log, 150 steps of 0.1 s: the window runs well past the end.
        let mut sim = recording_sim(150);
        let mut out = Vec::new();
        for _ in 0..150 {
            sim.step(&mut out).unwrap();
            assert_eq!(sim.horizon().len(), 6);
        }
        let last = sim.trajectory().last().state_vector();
        assert_eq!(sim.horizon().terminal().state, last);
    }

    #[test]
    fn telemetry_reports_pre_integration_state() {
        let mut sim = recording_sim(2);
        let mut out = Vec::new();
        sim.run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<Vec<f64>> = text
            .lines()
            .map(|l| l.split('\t').map(|v| v.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![0.0, 0.0, 0.0, -100.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rows[1][0], 0.1);
        assert!((rows[1][1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn solver_failure_is_tagged_with_step() {
        let mut solver = RecordingSolver::default();
        solver.fail_at = Some(3);
        let mut sim = Simulation::new(
            level_flight(10.0),
            solver,
            KinematicDynamics::default(),
            &SolverConfig::default(),
            DriverConfig::default(),
        )
        .unwrap();
        let err = sim.run(&mut Vec::new()).unwrap_err();
        match err {
            Error::Step { step, source } => {
                assert_eq!(step, 3);
                assert!(matches!(*source, Error::Solver(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(sim.steps_done(), 3);
    }

    #[test]
    fn closed_loop_with_in_process_collaborators() {
        let mut out = Vec::new();
        let summary = simulate(level_flight(12.0), DriverConfig::default(), &mut out).unwrap();
        assert_eq!(summary.steps, 500);
        assert!((summary.final_time - 10.0).abs() < 1e-9);
        assert!(summary.final_state.is_finite());

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 500);
        assert!(lines.iter().all(|l| l.split('\t').count() == 8));
        assert!(lines[0].starts_with("0.000000\t0.000000\t0.000000\t-100.000000\t"));
        assert!(lines[499].starts_with("9.980000\t"));
    }

    #[test]
    fn vehicle_starts_on_a_banked_sample() {
        let q = attitude::compose(0.3, 0.05, 0.2);
        let traj = Trajectory::new(vec![
            Sample {
                time: 0.0,
                position: Vector3::new(0.0, 0.0, -80.0),
                velocity: Vector3::new(18.0, 6.0, 0.0),
                attitude: q,
                angular_velocity: Vector3::new(0.0, 0.0, 0.1),
            },
            Sample {
                time: 20.0,
                position: Vector3::new(360.0, 120.0, -80.0),
                velocity: Vector3::new(18.0, 6.0, 0.0),
                attitude: q,
                angular_velocity: Vector3::new(0.0, 0.0, 0.1),
            },
        ])
        .unwrap();
        let sim = Simulation::new(
            traj,
            TrackingSolver::new(),
            FixedWingDynamics::default(),
            &SolverConfig::default(),
            DriverConfig::default(),
        )
        .unwrap();
        let s = sim.dynamics().state();
        assert_eq!(s.attitude, q);
        assert_eq!(s.angular_velocity, Vector3::new(0.0, 0.0, 0.1));
        assert_eq!(sim.horizon().len(), crate::gnc::HORIZON_LENGTH + 1);
    }
}
