//! Staged producer/transform/consumer pipeline (§3.5, §4.E): steps
//! connected by bounded queues, each step owning private type-erased
//! state and an independent worker-thread pool.
//!
//! This crate knows nothing about VDIF, Mark6, or FlexBuff — it is the
//! scheduling skeleton that `vlbi-runtime` wires recording-specific
//! steps into.

mod chain;
mod error;
mod queue;
mod step;

pub use chain::Chain;
pub use error::{ChainError, Result};
pub use step::{StepId, WorkerOutcome};
