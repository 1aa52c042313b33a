use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("mountpoint pattern '{0}' is not a valid glob or regex")]
    InvalidPattern(String),

    #[error("duplicate chunk (chunk_number={chunk_number}, suffix_id={suffix_id}) for recording '{recording}'")]
    DuplicateChunk { recording: String, chunk_number: u32, suffix_id: u32 },

    #[error("'{0}' is not a Mark6 recording: bad magic or unsupported version")]
    NotMark6(String),

    #[error("seek to negative or out-of-range position")]
    InvalidSeek,

    #[error("no mountpoints available to write to")]
    NoMountpoints,

    #[error("all 52 scan-name suffixes (a-z, A-Z) are already in use for '{0}'")]
    ScanNameSuffixesExhausted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
