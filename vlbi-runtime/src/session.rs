//! Per-session runtime state (§4.F): transfer-mode gating, the active
//! chain, network parameters, and statistics, all behind the single
//! lock the command dispatcher and status queries both take.
//!
//! `original_source/evlbi5a/runtime.cc` guards its state with a single
//! `pthread_mutex_t rte_mutex` taken by both command execution and
//! status polling; §5 calls this out as needing to be reentrant (a
//! command handler may itself query runtime state while holding the
//! lock), so this uses `parking_lot::ReentrantMutex` around a
//! `RefCell` rather than a plain `Mutex`.

use std::cell::RefCell;

use parking_lot::ReentrantMutex;

use crate::error::{Result, RuntimeError};
use crate::netparms::NetParms;
use crate::stats::Stats;
use crate::transfermode::{SubMode, TransferMode};

/// A running chain, type-erased so `RuntimeState` doesn't need to be
/// generic over the item type a particular transfer mode happens to
/// flow (frames, VDIF packets, raw blocks, ...).
pub trait ActiveChain: Send {
    fn gentle_stop(&mut self) -> vlbi_chain::Result<()>;
    fn stop(&mut self) -> vlbi_chain::Result<()>;
    fn join(&mut self) -> vlbi_chain::Result<()>;
    fn finalize(&mut self);
}

impl<T: Send + 'static> ActiveChain for vlbi_chain::Chain<T> {
    fn gentle_stop(&mut self) -> vlbi_chain::Result<()> {
        vlbi_chain::Chain::gentle_stop(self)
    }

    fn stop(&mut self) -> vlbi_chain::Result<()> {
        vlbi_chain::Chain::stop(self)
    }

    fn join(&mut self) -> vlbi_chain::Result<()> {
        vlbi_chain::Chain::join(self)
    }

    fn finalize(&mut self) {
        vlbi_chain::Chain::finalize(self)
    }
}

#[derive(Default)]
pub struct RuntimeState {
    pub mode: TransferMode,
    pub submode: SubMode,
    pub netparms: NetParms,
    pub stats: Stats,
    pub scan_name: Option<String>,
    active_chain: Option<Box<dyn ActiveChain>>,
}

impl RuntimeState {
    fn gate(&self, requested: TransferMode) -> Result<()> {
        if self.mode.is_idle() || self.mode == requested {
            Ok(())
        } else {
            Err(RuntimeError::WrongState { current: self.mode, requested })
        }
    }
}

/// The reentrant-locked handle callers actually hold.
pub struct Session {
    inner: ReentrantMutex<RefCell<RuntimeState>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session { inner: ReentrantMutex::new(RefCell::new(RuntimeState::default())) }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&RuntimeState) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard.borrow())
    }

    /// Begin a transfer: gated by §4.F's `(current, requested)` rule,
    /// transitions to `requested` and sets `wait`.
    pub fn start_transfer(&self, requested: TransferMode, chain: Box<dyn ActiveChain>) -> Result<()> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.gate(requested)?;
        state.mode = requested;
        state.submode.wait = true;
        state.submode.run = false;
        state.active_chain = Some(chain);
        Ok(())
    }

    /// `=on`: clear `wait`, set `run`.
    pub fn set_run(&self) -> Result<()> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        if state.mode.is_idle() {
            return Err(RuntimeError::NoTransfer);
        }
        state.submode.wait = false;
        state.submode.run = true;
        Ok(())
    }

    /// `=off` or `=disconnect`: cancel → join → finalize the active
    /// chain, then return to `no_transfer`.
    pub fn set_off_or_disconnect(&self) -> Result<()> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        let mut chain = state.active_chain.take().ok_or(RuntimeError::NoTransfer)?;
        chain.stop()?;
        chain.join()?;
        chain.finalize();
        state.mode = TransferMode::NoTransfer;
        state.submode = SubMode::default();
        Ok(())
    }

    pub fn current_mode(&self) -> TransferMode {
        self.with_state(|s| s.mode)
    }

    pub fn stats_snapshot(&self) -> crate::stats::StatsSnapshot {
        self.with_state(|s| s.stats.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopChain {
        stopped: bool,
        joined: bool,
        finalized: bool,
    }

    impl ActiveChain for NoopChain {
        fn gentle_stop(&mut self) -> vlbi_chain::Result<()> {
            Ok(())
        }
        fn stop(&mut self) -> vlbi_chain::Result<()> {
            self.stopped = true;
            Ok(())
        }
        fn join(&mut self) -> vlbi_chain::Result<()> {
            self.joined = true;
            Ok(())
        }
        fn finalize(&mut self) {
            self.finalized = true;
        }
    }

    #[test]
    fn second_transfer_request_for_a_different_mode_is_rejected() {
        let session = Session::new();
        session.start_transfer(TransferMode::Mk6Record, Box::new(NoopChain { stopped: false, joined: false, finalized: false })).unwrap();
        let err = session.start_transfer(TransferMode::VbsRecord, Box::new(NoopChain { stopped: false, joined: false, finalized: false }));
        assert!(err.is_err());
    }

    #[test]
    fn repeating_the_same_mode_is_allowed() {
        let session = Session::new();
        session.start_transfer(TransferMode::Mk6Record, Box::new(NoopChain { stopped: false, joined: false, finalized: false })).unwrap();
        assert!(session.start_transfer(TransferMode::Mk6Record, Box::new(NoopChain { stopped: false, joined: false, finalized: false })).is_ok());
    }

    #[test]
    fn off_runs_stop_join_finalize_and_returns_to_idle() {
        let session = Session::new();
        session.start_transfer(TransferMode::Mk6Record, Box::new(NoopChain { stopped: false, joined: false, finalized: false })).unwrap();
        session.set_run().unwrap();
        session.set_off_or_disconnect().unwrap();
        assert_eq!(session.current_mode(), TransferMode::NoTransfer);
    }

    #[test]
    fn run_without_an_active_transfer_is_rejected() {
        let session = Session::new();
        assert!(session.set_run().is_err());
    }
}
