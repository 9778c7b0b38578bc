use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::solver::SolveStatus;

#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The solver finished without an optimal assignment.
    #[error("no optimal solution: solver reported {status}")]
    InfeasibleOrUnbounded { status: SolveStatus },

    #[error("failed to write report to {}: {source}", path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown decision variable `{name}`")]
    UnknownVariable { name: String },

    /// The solver returned values that break a constraint or a bound.
    #[error("solver output violates `{constraint}`")]
    InfeasibleSolution { constraint: String },

    #[error("malformed report: {0}")]
    MalformedReport(String),

    #[error("invalid settings: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
