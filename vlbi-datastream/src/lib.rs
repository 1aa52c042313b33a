//! Data stream classification (§4.C): map a VDIF frame's station,
//! thread id and sender address onto the name of the data stream it
//! belongs to, as configured by a set of pattern-matched criteria.
//!
//! This crate owns no I/O of its own; `vlbi-runtime` calls
//! [`registry::DatastreamRegistry::classify`] per received frame and
//! uses the resulting name to pick a recording target.

pub mod error;
pub mod key;
pub mod matcher;
pub mod pattern;
pub mod registry;

pub use error::{DatastreamError, Result};
pub use key::{ThreadMatcher, VdifKey, VdifStation};
pub use matcher::MatchCriterion;
pub use registry::{DatastreamId, DatastreamRegistry};
