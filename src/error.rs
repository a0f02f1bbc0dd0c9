use thiserror::Error;

/// Errors raised while loading a flight log, resampling it, or running the
/// closed loop. None of these are recovered; the run aborts on the first one.
#[derive(Error, Debug)]
pub enum Error {
    #[error("field `{field}`: cannot parse `{value}` as a number")]
    Parse { field: String, value: String },

    #[error("line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    #[error("degenerate interpolation at t={time}: {reason}")]
    DegenerateInterpolation { time: f64, reason: String },

    #[error("solver: {0}")]
    Solver(String),

    #[error("dynamics: {0}")]
    Dynamics(String),

    #[error("step {step}: {source}")]
    Step {
        step: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Tag an error with the simulation step that produced it.
    pub fn at_step(self, step: usize) -> Self {
        Error::Step { step, source: Box::new(self) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
