//! `FormatDescriptor` — the data-only, tagged-variant frame format descriptor
//! (§3.1). Per the Design Notes' "cyclic graph" redesign, this carries no
//! behaviour or function pointers of its own; decoders in `mark4`,
//! `vlba_mark5b`, and `vdif` are free functions taking `(&FormatDescriptor,
//! &[u8])`.

use crate::bitrate::TrackBitRate;
use crate::error::{FormatError, Result};

fn is_power_of_two(n: u32) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Tape-format header byte order; Mark5B is little-endian, VLBA big-endian,
/// sharing one decoder (§4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Mark4Fields {
    pub ntrack: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VlbaFields {
    pub ntrack: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Mark5BFields {
    pub ntrack: u32,
    /// Heuristic flag: the subsecond field decoded to exactly zero, which is
    /// how DBE-style Mark5B (lacking real subsecond info) presents (§4.B
    /// edge case; see DESIGN.md Open Question 3 for the false-positive risk).
    pub dbe_no_subsecond: bool,
    /// Test-Vector-Generator payload, as opposed to real antenna data.
    pub tvg: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VdifFields {
    /// Per-thread channel count (not track count).
    pub nchan: u32,
    pub legacy: bool,
    pub complex: bool,
    pub bits_per_sample: u32,
}

/// Discriminated variant over the supported wire/tape format families (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum FormatKind {
    Mark4(Mark4Fields),
    Mark4StraightThrough(Mark4Fields),
    Vlba(VlbaFields),
    VlbaStraightThrough(VlbaFields),
    Mark5B(Mark5BFields),
    Vdif(VdifFields),
}

impl FormatKind {
    pub fn is_straight_through(self) -> bool {
        matches!(self, FormatKind::Mark4StraightThrough(_) | FormatKind::VlbaStraightThrough(_))
    }

    pub fn is_vdif(self) -> bool {
        matches!(self, FormatKind::Vdif(_))
    }

    pub fn ntrack(self) -> u32 {
        match self {
            FormatKind::Mark4(f) | FormatKind::Mark4StraightThrough(f) => f.ntrack,
            FormatKind::Vlba(f) | FormatKind::VlbaStraightThrough(f) => f.ntrack,
            FormatKind::Mark5B(f) => f.ntrack,
            FormatKind::Vdif(f) => f.nchan,
        }
    }
}

/// A fully resolved frame format descriptor (§3.1), including the derived
/// byte-layout fields and the invariants that tie them together.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FormatDescriptor {
    pub kind: FormatKind,
    pub trackbitrate: TrackBitRate,
    pub syncword_size: usize,
    pub syncword_offset: usize,
    pub headersize: usize,
    pub payloadsize: usize,
}

impl FormatDescriptor {
    /// Construct and validate a descriptor, enforcing the invariants of
    /// §3.1: `framesize = headersize + payloadsize`;
    /// `syncword_offset + syncword_size <= headersize`; tape-format header
    /// size equals `ntrack * per-track-bytes`; VDIF header size is 16
    /// (legacy) or 32 (standard) bytes; `ntrack`/`nchan` is a power of two.
    pub fn new(
        kind: FormatKind,
        trackbitrate: TrackBitRate,
        syncword_size: usize,
        syncword_offset: usize,
        headersize: usize,
        payloadsize: usize,
    ) -> Result<Self> {
        let ntrack = kind.ntrack();
        if !is_power_of_two(ntrack) || ntrack == 0 || ntrack > 64 {
            return Err(FormatError::InvalidNumberOfTracks(ntrack));
        }
        if syncword_offset + syncword_size > headersize {
            return Err(FormatError::InvalidDescriptor(format!(
                "syncword_offset({syncword_offset}) + syncword_size({syncword_size}) > headersize({headersize})"
            )));
        }
        match kind {
            // Mark4/VLBA interleave the header bit-by-bit across all ntrack
            // physical tracks, so the byte count scales with ntrack.
            // Mark5B's header is a fixed 16 bytes regardless of bitstream
            // count (ntrack there just labels how many bitstreams share it).
            FormatKind::Mark4(_) | FormatKind::Mark4StraightThrough(_) | FormatKind::Vlba(_)
            | FormatKind::VlbaStraightThrough(_) => {
                let per_track = headersize / ntrack as usize;
                if per_track * ntrack as usize != headersize {
                    return Err(FormatError::InvalidDescriptor(format!(
                        "tape header size {headersize} is not a multiple of ntrack {ntrack}"
                    )));
                }
            }
            FormatKind::Mark5B(_) => {
                if headersize != 16 {
                    return Err(FormatError::InvalidDescriptor(format!(
                        "Mark5B header size must be 16 bytes, got {headersize}"
                    )));
                }
            }
            FormatKind::Vdif(f) => {
                let expected = if f.legacy { 16 } else { 32 };
                if headersize != expected {
                    return Err(FormatError::InvalidDescriptor(format!(
                        "VDIF header size {headersize} must be {expected} (legacy={})",
                        f.legacy
                    )));
                }
            }
        }
        Ok(FormatDescriptor {
            kind,
            trackbitrate,
            syncword_size,
            syncword_offset,
            headersize,
            payloadsize,
        })
    }

    pub fn framesize(&self) -> usize {
        self.headersize + self.payloadsize
    }

    pub fn payloadoffset(&self) -> usize {
        self.headersize
    }
}
