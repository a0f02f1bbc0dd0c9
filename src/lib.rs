pub mod attitude;
pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod io;
pub mod reference;
pub mod sim;
pub mod units;

pub use error::{Error, Result};
