use std::io;

use nalgebra::{UnitQuaternion, Vector3};

use nmpc_replay::dynamics::state::ControlCommand;
use nmpc_replay::dynamics::FixedWingDynamics;
use nmpc_replay::gnc::{Solver, SolverConfig};
use nmpc_replay::reference::{ReferencePoint, Sample, StateVector, Trajectory};
use nmpc_replay::sim::{DriverConfig, Simulation};
use nmpc_replay::Result;

/// Open-loop solver: ignores the state and applies each node's feedforward,
/// clamped to the configured bounds.
struct HoldSolver {
    config: SolverConfig,
    horizon: Vec<Option<ReferencePoint>>,
}

impl Solver for HoldSolver {
    fn configure(&mut self, config: &SolverConfig) -> Result<()> {
        config.validate()?;
        self.config = config.clone();
        Ok(())
    }

    fn initialise_horizon(&mut self) -> Result<()> {
        self.horizon = vec![None; self.horizon_length() + 1];
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn solve(&mut self, _state: &StateVector) -> Result<ControlCommand> {
        let ff = self.horizon[0].as_ref().and_then(|p| p.feedforward).unwrap_or_default();
        Ok(self.config.clamp(ff))
    }

    fn set_reference(&mut self, index: usize, reference: &ReferencePoint) -> Result<()> {
        self.horizon[index] = Some(reference.clone());
        Ok(())
    }

    fn update_horizon(&mut self, terminal: &StateVector) -> Result<()> {
        let ff = self.horizon[0].as_ref().and_then(|p| p.feedforward);
        self.horizon.remove(0);
        if let Some(Some(last)) = self.horizon.last_mut() {
            last.feedforward = ff;
        }
        self.horizon.push(Some(ReferencePoint { time: 0.0, state: *terminal, feedforward: None }));
        Ok(())
    }

    fn horizon_length(&self) -> usize {
        20
    }

    fn step_length(&self) -> f64 {
        0.02
    }

    fn name(&self) -> &str {
        "Hold"
    }
}

fn main() -> Result<()> {
    // 12 s of straight and level flight at 20 m/s, 100 m above the origin
    let samples = (0..=120)
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
        .collect();
    let trajectory = Trajectory::new(samples)?;

    let solver = HoldSolver { config: SolverConfig::default(), horizon: Vec::new() };
    let mut sim = Simulation::new(
        trajectory,
        solver,
        FixedWingDynamics::default(),
        &SolverConfig::default(),
        DriverConfig::default(),
    )?;

    println!("Replaying with {} solver...", sim.solver().name());
    let summary = sim.run(&mut io::sink())?;

    let reference = sim.trajectory().at(summary.final_time)?;
    let miss = (summary.final_state.position - reference.position).norm();
    let (roll, pitch, yaw) = summary.final_state.attitude.inverse().euler_angles();

    println!("Steps: {}  t = {:.2} s", summary.steps, summary.final_time);
    println!("Position error vs log: {:.1} m", miss);
    println!(
        "Final attitude: roll {:.1}°, pitch {:.1}°, yaw {:.1}°",
        roll.to_degrees(),
        pitch.to_degrees(),
        yaw.to_degrees()
    );
    Ok(())
}
