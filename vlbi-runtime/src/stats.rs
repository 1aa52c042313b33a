//! Transfer statistics counters (§5: "Statistics counters are atomic
//! integers").

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct Stats {
    bytes_transferred: AtomicU64,
    frames_seen: AtomicU64,
    frames_rejected: AtomicU64,
}

/// Point-in-time copy of [`Stats`], cheap to pass across the command
/// dispatch boundary and to serialize for a status query reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub bytes_transferred: u64,
    pub frames_seen: u64,
    pub frames_rejected: u64,
}

impl Stats {
    pub fn new() -> Self {
        Stats::default()
    }

    pub fn add_bytes(&self, n: u64) {
        self.bytes_transferred.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_frame_seen(&self) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.bytes_transferred.store(0, Ordering::Relaxed);
        self.frames_seen.store(0, Ordering::Relaxed);
        self.frames_rejected.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let stats = Stats::new();
        stats.add_bytes(100);
        stats.add_frame_seen();
        stats.add_frame_seen();
        stats.add_frame_rejected();

        let snap = stats.snapshot();
        assert_eq!(snap.bytes_transferred, 100);
        assert_eq!(snap.frames_seen, 2);
        assert_eq!(snap.frames_rejected, 1);

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
