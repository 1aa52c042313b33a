//! Transfer-mode enum and sub-mode flags (§4.F).
//!
//! The JIVE original carries close to thirty mode values accumulated
//! over successive hardware generations (StreamStor-specific modes,
//! legacy disk formats, etc). Most of those are site-specific tooling
//! history rather than behaviour this crate needs to reproduce; the
//! variants below are the ones the rest of the system (chain wiring,
//! command dispatch, scenario tests) actually exercises.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferMode {
    NoTransfer,
    VbsRecord,
    Mk6Record,
    Net2Vbs,
    Net2Mk6,
    In2Net,
    Net2Out,
    Disk2Net,
    Net2Disk,
    Disk2File,
    File2Disk,
    Fill2Net,
    Fill2Vbs,
    Net2Check,
    Vbs2Check,
    Spill2Net,
    Spin2Net,
    Spif2Net,
}

impl TransferMode {
    pub fn is_idle(self) -> bool {
        matches!(self, TransferMode::NoTransfer)
    }

    /// Whether this mode records to striped storage (VBS or Mark6).
    pub fn is_recording(self) -> bool {
        matches!(self, TransferMode::VbsRecord | TransferMode::Mk6Record | TransferMode::Net2Vbs | TransferMode::Net2Mk6)
    }
}

impl Default for TransferMode {
    fn default() -> Self {
        TransferMode::NoTransfer
    }
}

/// Sub-mode flags orthogonal to the transfer mode itself (§4.F).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMode {
    pub connected: bool,
    pub run: bool,
    pub pause: bool,
    pub wait: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_no_transfer_and_idle() {
        assert_eq!(TransferMode::default(), TransferMode::NoTransfer);
        assert!(TransferMode::NoTransfer.is_idle());
    }

    #[test]
    fn recording_modes_are_flagged() {
        assert!(TransferMode::Mk6Record.is_recording());
        assert!(!TransferMode::In2Net.is_recording());
    }
}
