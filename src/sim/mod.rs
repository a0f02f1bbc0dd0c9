pub mod driver;
pub mod integrator;

pub use driver::{simulate, DriverConfig, RunSummary, Simulation};
pub use integrator::rk4_step;
