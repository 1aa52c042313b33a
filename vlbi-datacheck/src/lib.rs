//! Scan-check / data-check engine: probe a sampled byte range for a VLBI
//! frame format, combine partial probes taken at different offsets into a
//! complete description, and report how many bytes (if any) of a recording
//! are unaccounted for.
//!
//! This crate owns no storage or transport concerns of its own — it reads
//! through the [`reader::ByteRangeReader`] abstraction, so it works
//! equally over an in-memory buffer, a plain file, or (via `vlbi-storage`)
//! a striped VBS/Mark6 recording.

pub mod combine;
pub mod error;
pub mod probe;
pub mod reader;
pub mod result;
pub mod scan;

pub use combine::combine_data_check_results;
pub use error::{DataCheckError, Result};
pub use probe::{find_data_format, is_data_format};
pub use reader::{ByteRangeReader, FileByteRangeReader};
pub use result::DataCheckResult;
pub use scan::{scan_check, ScanCheckResult};
