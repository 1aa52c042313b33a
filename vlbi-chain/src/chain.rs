//! Chain lifecycle (§3.5): build → register → run → (steady-state or
//! cancel) → join → finalize → dispose.
//!
//! Items flow through a single type `T` from step to step — a real
//! recording chain's stages (reader, frame-classifier, writer) overlay
//! different meanings onto the same item type (e.g. an enum of frame
//! kinds) rather than this crate changing the wire type mid-chain;
//! `thunk.h`'s erased user-data makes each step's *private* state
//! independent, which is the half of heterogeneity this crate actually
//! needs.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::error::{ChainError, Result};
use crate::queue::Edge;
use crate::step::{HandlerFn, StepEntry, StepId, UserData, Worker, WorkerOutcome};

/// Log a worker's panic payload, if it had one, and let the thread
/// return normally either way (§7: a worker panic is "caught, logged,
/// and treated as that worker exiting").
fn log_if_panicked(id: StepId, outcome: std::thread::Result<()>) {
    if let Err(panic) = outcome {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "worker panicked with a non-string payload".to_string());
        log::error!("step {id:?} worker panicked: {message}");
    }
}

enum RunState<T> {
    Built,
    Running { edges: Vec<Edge<T>>, handles: Vec<(StepId, JoinHandle<()>)> },
    Joined,
}

/// A pipeline of steps connected by bounded queues (§3.5 `chain`).
pub struct Chain<T> {
    steps: Vec<StepEntry<T>>,
    next_id: u32,
    state: RunState<T>,
}

impl<T: Send + 'static> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Chain<T> {
    pub fn new() -> Self {
        Chain { steps: Vec::new(), next_id: 0, state: RunState::Built }
    }

    fn alloc_id(&mut self) -> StepId {
        let id = StepId(self.next_id);
        self.next_id += 1;
        id
    }

    fn wrap_user_data<U: Send + 'static>(user_data: U) -> Arc<Mutex<UserData>> {
        Arc::new(Mutex::new(Box::new(user_data) as UserData))
    }

    /// Add the chain's source step: no input queue, pulled by its own
    /// worker thread(s) which generate items directly.
    pub fn add_source<U: Send + 'static>(
        &mut self,
        user_data: U,
        queue_depth: usize,
        worker: impl Fn(&mut U, &crossbeam_channel::Sender<T>) -> WorkerOutcome + Send + Sync + 'static,
    ) -> StepId {
        let id = self.alloc_id();
        let worker = Arc::new(move |ud: &mut UserData, out: &crossbeam_channel::Sender<T>| {
            worker(ud.downcast_mut::<U>().expect("step worker called with mismatched user-data type"), out)
        });
        self.steps.push(StepEntry {
            id,
            user_data: Self::wrap_user_data(user_data),
            worker: Worker::Source(worker),
            cancel: None,
            finalize: None,
            nthread: 1,
            queue_depth,
        });
        id
    }

    /// Add an intermediate transform step: one input item in, zero or
    /// more output items produced via the output queue handle.
    pub fn add_transform<U: Send + 'static>(
        &mut self,
        user_data: U,
        queue_depth: usize,
        worker: impl Fn(&mut U, T, &crossbeam_channel::Sender<T>) -> WorkerOutcome + Send + Sync + 'static,
    ) -> StepId {
        let id = self.alloc_id();
        let worker = Arc::new(move |ud: &mut UserData, item: T, out: &crossbeam_channel::Sender<T>| {
            worker(ud.downcast_mut::<U>().expect("step worker called with mismatched user-data type"), item, out)
        });
        self.steps.push(StepEntry {
            id,
            user_data: Self::wrap_user_data(user_data),
            worker: Worker::Transform(worker),
            cancel: None,
            finalize: None,
            nthread: 1,
            queue_depth,
        });
        id
    }

    /// Add the chain's sink step: consumes items, produces none.
    pub fn add_sink<U: Send + 'static>(
        &mut self,
        user_data: U,
        queue_depth: usize,
        worker: impl Fn(&mut U, T) -> WorkerOutcome + Send + Sync + 'static,
    ) -> StepId {
        let id = self.alloc_id();
        let worker = Arc::new(move |ud: &mut UserData, item: T| {
            worker(ud.downcast_mut::<U>().expect("step worker called with mismatched user-data type"), item)
        });
        self.steps.push(StepEntry {
            id,
            user_data: Self::wrap_user_data(user_data),
            worker: Worker::Sink(worker),
            cancel: None,
            finalize: None,
            nthread: 1,
            queue_depth,
        });
        id
    }

    fn find_mut(&mut self, id: StepId) -> Result<&mut StepEntry<T>> {
        self.steps.iter_mut().find(|s| s.id == id).ok_or(ChainError::UnknownStep(id))
    }

    pub fn register_cancel<U: Send + 'static>(&mut self, id: StepId, handler: impl Fn(&mut U) + Send + Sync + 'static) -> Result<()> {
        let step = self.find_mut(id)?;
        let handler: HandlerFn = Arc::new(move |ud| handler(ud.downcast_mut::<U>().expect("cancel handler type mismatch")));
        step.cancel = Some(handler);
        Ok(())
    }

    pub fn register_final<U: Send + 'static>(&mut self, id: StepId, handler: impl Fn(&mut U) + Send + Sync + 'static) -> Result<()> {
        let step = self.find_mut(id)?;
        let handler: HandlerFn = Arc::new(move |ud| handler(ud.downcast_mut::<U>().expect("finalizer type mismatch")));
        step.finalize = Some(handler);
        Ok(())
    }

    pub fn nthread(&mut self, id: StepId, count: usize) -> Result<()> {
        self.find_mut(id)?.nthread = count.max(1);
        Ok(())
    }

    /// Instantiate one bounded queue between each adjacent pair of
    /// steps and spawn every step's configured worker thread(s).
    pub fn run(&mut self) -> Result<()> {
        if !matches!(self.state, RunState::Built) {
            return Err(ChainError::AlreadyRunning);
        }
        let n = self.steps.len();
        // edges[i] feeds step i+1 from step i's output, sized by the
        // *downstream* step's requested queue depth.
        let edges: Vec<Edge<T>> = (1..n).map(|i| Edge::new(self.steps[i].queue_depth)).collect();
        let mut handles = Vec::new();

        for (i, step) in self.steps.iter().enumerate() {
            let upstream = if i == 0 { None } else { Some(&edges[i - 1]) };
            let downstream = if i + 1 < n { Some(&edges[i]) } else { None };

            for _ in 0..step.nthread {
                let user_data = Arc::clone(&step.user_data);
                let id = step.id;
                let receiver = upstream.map(|e| e.receiver.clone());
                let sender = downstream.map(|e| e.sender.clone());

                let handle = match &step.worker {
                    Worker::Source(worker) => {
                        let worker = Arc::clone(worker);
                        let sender = sender.expect("a source step always has a downstream queue");
                        let closing = Arc::clone(&edges[i].closing);
                        std::thread::spawn(move || {
                            let outcome = catch_unwind(AssertUnwindSafe(|| loop {
                                if closing.load(std::sync::atomic::Ordering::SeqCst) {
                                    break;
                                }
                                let outcome = {
                                    let mut guard = user_data.lock();
                                    worker(&mut guard, &sender)
                                };
                                if outcome == WorkerOutcome::Stop {
                                    break;
                                }
                            }));
                            log_if_panicked(id, outcome);
                        })
                    }
                    Worker::Transform(worker) => {
                        let worker = Arc::clone(worker);
                        let receiver = receiver.expect("a transform step always has an upstream queue");
                        let sender = sender.expect("a transform step always has a downstream queue");
                        std::thread::spawn(move || {
                            // No upstream-closing check here: a transform
                            // must drain every item already queued on its
                            // input edge even after `gentle_stop` flips
                            // every edge's flag, and only stop once
                            // `recv` reports the upstream producer gone.
                            let outcome = catch_unwind(AssertUnwindSafe(|| loop {
                                match receiver.recv() {
                                    Ok(item) => {
                                        let outcome = {
                                            let mut guard = user_data.lock();
                                            worker(&mut guard, item, &sender)
                                        };
                                        if outcome == WorkerOutcome::Stop {
                                            break;
                                        }
                                    }
                                    Err(_) => break, // upstream drained and closed
                                }
                            }));
                            log_if_panicked(id, outcome);
                        })
                    }
                    Worker::Sink(worker) => {
                        let worker = Arc::clone(worker);
                        let receiver = receiver.expect("a sink step always has an upstream queue");
                        std::thread::spawn(move || {
                            let outcome = catch_unwind(AssertUnwindSafe(|| loop {
                                match receiver.recv() {
                                    Ok(item) => {
                                        let outcome = {
                                            let mut guard = user_data.lock();
                                            worker(&mut guard, item)
                                        };
                                        if outcome == WorkerOutcome::Stop {
                                            break;
                                        }
                                    }
                                    Err(_) => break,
                                }
                            }));
                            log_if_panicked(id, outcome);
                        })
                    }
                };
                handles.push((id, handle));
            }
        }

        self.state = RunState::Running { edges, handles };
        Ok(())
    }

    /// Close the output side of each queue in source-to-sink order,
    /// letting every stage drain what's already queued and exit.
    pub fn gentle_stop(&mut self) -> Result<()> {
        match &self.state {
            RunState::Running { edges, .. } => {
                for edge in edges {
                    edge.request_close();
                }
                Ok(())
            }
            _ => Err(ChainError::NotRunning),
        }
    }

    /// `gentle_stop` plus running every registered cancellation handler
    /// in registration order, to unblock workers stuck in blocking I/O.
    pub fn stop(&mut self) -> Result<()> {
        self.gentle_stop()?;
        for step in &self.steps {
            if let Some(cancel) = &step.cancel {
                let mut guard = step.user_data.lock();
                cancel(&mut guard);
            }
        }
        Ok(())
    }

    /// Reach into a running step's live user-data and invoke `f` on it
    /// under that step's mutex (§4.E `communicate`).
    pub fn communicate<U: Send + 'static, R>(&self, id: StepId, f: impl FnOnce(&mut U) -> R) -> Result<R> {
        let step = self.steps.iter().find(|s| s.id == id).ok_or(ChainError::UnknownStep(id))?;
        let mut guard = step.user_data.lock();
        let user_data: &mut dyn Any = &mut **guard;
        let typed = user_data.downcast_mut::<U>().ok_or(ChainError::WrongUserDataType)?;
        Ok(f(typed))
    }

    /// Wait for every spawned worker thread to exit. Each thread's own
    /// loop already caught and logged any panic from its worker
    /// closure (see `run`), so a thread only returns `Err` here if the
    /// panic happened outside that guard.
    pub fn join(&mut self) -> Result<()> {
        let (_, handles) = match std::mem::replace(&mut self.state, RunState::Joined) {
            RunState::Running { edges, handles } => (edges, handles),
            other => {
                self.state = other;
                return Err(ChainError::NotRunning);
            }
        };
        for (id, handle) in handles {
            if handle.join().is_err() {
                log::error!("step {id:?} worker thread did not exit cleanly");
            }
        }
        Ok(())
    }

    /// Call registered finalizers in reverse registration order.
    pub fn finalize(&mut self) {
        for step in self.steps.iter().rev() {
            if let Some(finalize) = &step.finalize {
                let mut guard = step.user_data.lock();
                finalize(&mut guard);
            }
        }
    }

    /// Release every step's queues and user-data.
    pub fn dispose(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn source_transform_sink_pipeline_moves_items_through() {
        let mut chain: Chain<u32> = Chain::new();
        let produced = Arc::new(AtomicUsize::new(0));
        let produced_clone = Arc::clone(&produced);

        chain.add_source(0u32, 4, move |count, out| {
            if *count >= 5 {
                return WorkerOutcome::Stop;
            }
            *count += 1;
            produced_clone.fetch_add(1, Ordering::SeqCst);
            out.send(*count).ok();
            WorkerOutcome::Continue
        });
        chain.add_transform((), 4, |_, item, out| {
            out.send(item * 2).ok();
            WorkerOutcome::Continue
        });
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_sink = Arc::clone(&received);
        chain.add_sink(received_sink, 4, |sink, item| {
            sink.lock().push(item);
            WorkerOutcome::Continue
        });

        chain.run().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));
        chain.gentle_stop().unwrap();
        chain.join().unwrap();
        chain.finalize();

        assert_eq!(produced.load(Ordering::SeqCst), 5);
        assert_eq!(received.lock().len(), 5);
    }

    #[test]
    fn communicate_reaches_live_step_state() {
        let mut chain: Chain<u32> = Chain::new();
        let id = chain.add_source(0u32, 1, |count, out| {
            *count += 1;
            out.send(*count).ok();
            if *count > 1000 {
                WorkerOutcome::Stop
            } else {
                WorkerOutcome::Continue
            }
        });
        chain.add_sink((), 1, |_, _item: u32| WorkerOutcome::Continue);
        chain.run().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let value: u32 = chain.communicate(id, |count: &mut u32| *count).unwrap();
        assert!(value > 0);
        chain.stop().unwrap();
        chain.join().unwrap();
        chain.finalize();
    }

    #[test]
    fn unknown_step_id_is_reported() {
        let chain: Chain<u32> = Chain::new();
        assert!(chain.communicate(StepId(99), |_: &mut u32| {}).is_err());
    }
}
