use thiserror::Error;

use crate::step::StepId;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("no step with id {0:?}")]
    UnknownStep(StepId),

    #[error("a step's user-data was not of the type the caller expected")]
    WrongUserDataType,

    #[error("the chain is already running")]
    AlreadyRunning,

    #[error("the chain has not been started yet")]
    NotRunning,

    #[error("worker thread for step {0:?} panicked: {1}")]
    WorkerPanicked(StepId, String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
