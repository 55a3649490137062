use thiserror::Error;

/// A broken upstream precondition. Passes never publish partial results
/// alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("function `{func}` has no ret-terminated exit block")]
    MissingExit { func: String },

    #[error("function `{func}` has more than one ret-terminated exit block")]
    MultipleExits { func: String },

    #[error("function `{func}`: no reaching definition for an expression available on entry")]
    NoReachingDef { func: String },
}
