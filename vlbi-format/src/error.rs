use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid format string: {0}")]
    InvalidFormatString(String),

    #[error("invalid track bitrate: {0:?}")]
    InvalidTrackBitrate(Option<u64>),

    #[error("invalid number of tracks: {0} (must be a power of two in 1..=64)")]
    InvalidNumberOfTracks(u32),

    #[error("invalid track requested: {requested} (ntrack={ntrack})")]
    InvalidTrackRequested { requested: u32, ntrack: u32 },

    #[error("sync word not found in buffer of {len} bytes")]
    SyncWordNotFound { len: usize },

    #[error("CRC mismatch: expected 0x{expected:x}, computed 0x{computed:x}")]
    CrcMismatch { expected: u32, computed: u32 },

    #[error("header truncated: need {need} bytes, have {have}")]
    HeaderTruncated { need: usize, have: usize },

    #[error("subsecond time is unknown")]
    UnknownSubsecond,

    #[error("descriptor invariant violated: {0}")]
    InvalidDescriptor(String),
}

pub type Result<T> = std::result::Result<T, FormatError>;
