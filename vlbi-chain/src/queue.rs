//! The bounded queue sitting between two adjacent steps (§3.5): a thin
//! wrapper around a `crossbeam_channel` pair, plus the stop flag a
//! `gentle_stop()` sets to tell the upstream producer to quit pushing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

pub(crate) struct Edge<T> {
    pub(crate) sender: Sender<T>,
    pub(crate) receiver: Receiver<T>,
    pub(crate) closing: Arc<AtomicBool>,
}

impl<T> Edge<T> {
    pub(crate) fn new(depth: usize) -> Self {
        let (sender, receiver) = bounded(depth.max(1));
        Edge { sender, receiver, closing: Arc::new(AtomicBool::new(false)) }
    }

    pub(crate) fn request_close(&self) {
        self.closing.store(true, Ordering::SeqCst);
    }
}
