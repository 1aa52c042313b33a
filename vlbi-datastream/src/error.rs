use thiserror::Error;

use crate::key::MAX_THREAD_ID;

#[derive(Error, Debug)]
pub enum DatastreamError {
    #[error("the data stream '{0}' already has a definition")]
    DuplicateName(String),

    #[error("the data stream '{0}' was not defined so cannot remove it")]
    Undefined(String),

    #[error("no defined data stream matches VDIF key (station_id={station_id:#06x}, thread_id={thread_id})")]
    NoMatch { station_id: u16, thread_id: u16 },

    #[error("VDIF station code must be 1 or 2 characters, not '{0}'")]
    InvalidStationCode(String),

    #[error("thread id {0} is out of range (0..{MAX_THREAD_ID})")]
    ThreadIdOutOfRange(u16),

    #[error("the criterion '{0}' does not match the expected pattern")]
    InvalidPattern(String),

    #[error("port '{0}' is out of range")]
    PortOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, DatastreamError>;
