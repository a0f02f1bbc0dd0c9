pub mod telemetry;
pub mod xplane;

pub use xplane::read_trajectory;
