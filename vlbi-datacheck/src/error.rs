use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataCheckError {
    #[error("no recognisable frame format found in the sampled range")]
    NoFormatFound,

    #[error("probes disagree on format or track count")]
    InconsistentFormats,

    #[error(transparent)]
    Format(#[from] vlbi_format::FormatError),

    #[error("I/O error reading sample range: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataCheckError>;
