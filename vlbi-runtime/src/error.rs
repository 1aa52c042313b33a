use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("command rejected: current mode is {current:?}, requested {requested:?}")]
    WrongState { current: crate::transfermode::TransferMode, requested: crate::transfermode::TransferMode },

    #[error("no transfer is active")]
    NoTransfer,

    #[error("a transfer is already active in mode {0:?}")]
    AlreadyTransferring(crate::transfermode::TransferMode),

    #[error(transparent)]
    Chain(#[from] vlbi_chain::ChainError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
