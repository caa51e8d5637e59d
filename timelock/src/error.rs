use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelockError {
    #[error("caller {caller} lacks the {role} role")]
    Unauthorized { caller: String, role: &'static str },

    #[error("operation {0} is already scheduled")]
    OperationAlreadyScheduled(String),

    #[error("operation {0} is not scheduled")]
    OperationNotFound(String),

    #[error("operation {0} is not ready for execution")]
    OperationNotReady(String),

    #[error("operation {0} has already been executed")]
    OperationAlreadyDone(String),

    #[error("delay {have}s is below the minimum {need}s")]
    DelayTooShort { have: u64, need: u64 },
}
