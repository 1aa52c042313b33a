//! A single stage of a chain (§3.5 `step`): a worker function, the
//! queue depth it asks of its upstream edge, its own user-data, and
//! optional cancellation/finalization handlers.
//!
//! User-data is type-erased behind `Box<dyn Any + Send>` so steps of
//! different concrete user-data types can live in the same chain —
//! `thunk.h`'s RTTI-checked cached call is the same idea, done here
//! with `std::any::Any::downcast_mut` instead of a stashed type-name.

use std::any::Any;
use std::sync::Arc;

use crossbeam_channel::Sender;

/// Whether a worker invocation wants to keep running or is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Continue,
    Stop,
}

/// Opaque handle to a step, valid for the lifetime of the chain that
/// created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(pub u32);

pub(crate) type UserData = Box<dyn Any + Send>;
pub(crate) type HandlerFn = Arc<dyn Fn(&mut UserData) + Send + Sync>;

/// A step's role determines its worker function's signature: a source
/// has no input queue, a sink has no output queue, a transform has
/// both (§3.5/§4.E).
pub(crate) enum Worker<T> {
    Source(Arc<dyn Fn(&mut UserData, &Sender<T>) -> WorkerOutcome + Send + Sync>),
    Transform(Arc<dyn Fn(&mut UserData, T, &Sender<T>) -> WorkerOutcome + Send + Sync>),
    Sink(Arc<dyn Fn(&mut UserData, T) -> WorkerOutcome + Send + Sync>),
}

pub(crate) struct StepEntry<T> {
    pub(crate) id: StepId,
    pub(crate) user_data: Arc<parking_lot::Mutex<UserData>>,
    pub(crate) worker: Worker<T>,
    pub(crate) cancel: Option<HandlerFn>,
    pub(crate) finalize: Option<HandlerFn>,
    pub(crate) nthread: usize,
    pub(crate) queue_depth: usize,
}
