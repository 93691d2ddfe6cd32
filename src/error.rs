/// failure taxonomy. configuration and abstraction mismatches are fatal
/// at startup; incomplete checkpoints are skipped; worker failures are
/// survivable while at least one worker remains; invariant violations
/// abort the current iteration only.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Configuration(String),
    AbstractionMismatch { expected: String, found: String },
    CheckpointIncomplete(String),
    WorkerFailure(String),
    /// not a failure of the run: the solve loop could not
    /// reach min_iterations in budget, so the caller takes
    /// the blueprint fallback and counts it in telemetry
    ResolverTimeout { iterations: usize },
    InvariantViolation(String),
}

impl Error {
    /// process exit code identifying the error class
    pub fn code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 2,
            Error::AbstractionMismatch { .. } => 3,
            Error::CheckpointIncomplete(_) => 4,
            Error::WorkerFailure(_) => 5,
            Error::InvariantViolation(_) => 6,
            Error::ResolverTimeout { .. } => 7,
        }
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Configuration(what) => write!(f, "configuration: {}", what),
            Error::AbstractionMismatch { expected, found } => {
                write!(f, "abstraction mismatch: expected {} found {}", expected, found)
            }
            Error::CheckpointIncomplete(what) => write!(f, "checkpoint incomplete: {}", what),
            Error::WorkerFailure(what) => write!(f, "worker failure: {}", what),
            Error::ResolverTimeout { iterations } => {
                write!(f, "resolver timed out after {} iterations", iterations)
            }
            Error::InvariantViolation(what) => write!(f, "invariant violation: {}", what),
        }
    }
}
