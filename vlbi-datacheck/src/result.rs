//! `DataCheckResult` (§3.2): a best-effort description of what was found in
//! a sampled byte range.

use std::collections::BTreeMap;
use vlbi_format::descriptor::FormatKind;
use vlbi_format::vdif::VdifHeader;
use vlbi_format::{Timestamp, TrackBitRate};

#[derive(Debug, Clone, serde::Serialize)]
pub struct DataCheckResult {
    pub kind: FormatKind,
    pub trackbitrate: TrackBitRate,
    /// Byte offset of the first complete frame within the sampled range.
    pub byte_offset: u64,
    /// Frame number within its second.
    pub frame_number: u32,
    pub time: Timestamp,
    /// Observed VDIF `(thread_id -> header)` pairs; empty for non-VDIF formats.
    pub vdif_threads: BTreeMap<u16, VdifHeader>,
    pub vdif_frame_size: Option<u32>,
    pub vdif_data_size: Option<u32>,
    /// Mark5B Test-Vector-Generator flag.
    pub tvg_flag: bool,
    /// Mark5B "DBE-style, no subsecond field" flag (§4.B edge case).
    pub dbe_flag: bool,
    /// The matched descriptor's payload size in bytes, needed by
    /// `combine::copy_subsecond` to turn a frame number back into a
    /// subsecond offset (§4.B.5). Zero until a probe fills it in.
    pub payloadsize: usize,
    /// The matched descriptor's header size in bytes; together with
    /// `payloadsize` gives the full on-wire frame size used by
    /// `combine`'s byte-distance bitrate derivation.
    pub headersize: usize,
}

impl DataCheckResult {
    pub fn new(kind: FormatKind, trackbitrate: TrackBitRate, byte_offset: u64, frame_number: u32, time: Timestamp) -> Self {
        DataCheckResult {
            kind,
            trackbitrate,
            byte_offset,
            frame_number,
            time,
            vdif_threads: BTreeMap::new(),
            vdif_frame_size: None,
            vdif_data_size: None,
            tvg_flag: false,
            dbe_flag: false,
            payloadsize: 0,
            headersize: 0,
        }
    }

    /// Full on-wire frame size (header + payload).
    pub fn framesize(&self) -> usize {
        self.headersize + self.payloadsize
    }

    /// Number of distinct VDIF threads seen, or 1 for non-VDIF formats
    /// (§4.B.5's `vdif_threads` multiplier).
    pub fn thread_count(&self) -> usize {
        if self.is_vdif() {
            self.vdif_threads.len().max(1)
        } else {
            1
        }
    }

    /// A result is partial if either the track bitrate or the subsecond
    /// time is unknown (§3.2).
    pub fn is_partial(&self) -> bool {
        self.trackbitrate.is_unknown() || self.time.subsecond.is_unknown()
    }

    pub fn is_vdif(&self) -> bool {
        self.kind.is_vdif()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlbi_format::descriptor::{Mark5BFields, VdifFields};
    use vlbi_format::{Rational, Subsecond};

    #[test]
    fn partial_when_trackbitrate_unknown() {
        let r = DataCheckResult::new(
            FormatKind::Mark5B(Mark5BFields { ntrack: 32, dbe_no_subsecond: false, tvg: false }),
            TrackBitRate::UNKNOWN,
            0,
            0,
            Timestamp::new(0, Subsecond::known(Rational::new(0, 1))),
        );
        assert!(r.is_partial());
    }

    #[test]
    fn not_partial_when_both_known() {
        let r = DataCheckResult::new(
            FormatKind::Vdif(VdifFields { nchan: 1, legacy: false, complex: false, bits_per_sample: 2 }),
            TrackBitRate::known(2_000_000).unwrap(),
            0,
            0,
            Timestamp::new(0, Subsecond::known(Rational::new(0, 1))),
        );
        assert!(!r.is_partial());
        assert!(r.is_vdif());
    }
}
