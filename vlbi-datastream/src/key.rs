//! Identity of one VDIF source: station, thread and sender address
//! (§4.C), mirroring `mk6info.cc`'s `vdif_key`/`vdif_station`.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::{DatastreamError, Result};

/// VDIF thread ids are 10 bits wide.
pub const MAX_THREAD_ID: u16 = 1 << 10;

/// The two-letter (or hex, or numeric) station identifier carried by a
/// matched key. Station code bytes follow the wire order used by
/// `vdif_key::station_code`: `[1]` holds the first character, `[0]` the
/// second (absent for a one-character code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VdifKey {
    pub station_id: u16,
    pub station_code: [u8; 2],
    pub thread_id: u16,
    pub origin_addr: Ipv4Addr,
    pub origin_port: u16,
}

impl VdifKey {
    pub fn numeric(station_id: u16, thread_id: u16, origin: SocketAddrV4) -> Self {
        VdifKey { station_id, station_code: [0, 0], thread_id, origin_addr: *origin.ip(), origin_port: origin.port() }
    }

    pub fn coded(code: &str, thread_id: u16, origin: SocketAddrV4) -> Result<Self> {
        if code.is_empty() || code.len() > 2 {
            return Err(DatastreamError::InvalidStationCode(code.to_string()));
        }
        let bytes = code.as_bytes();
        let station_code = [if bytes.len() > 1 { bytes[1] } else { b' ' }, bytes[0]];
        Ok(VdifKey { station_id: 0, station_code, thread_id, origin_addr: *origin.ip(), origin_port: origin.port() })
    }

    /// Whether the station code looks like two printable characters
    /// rather than a raw numeric id (`vdif_key::printable_station`).
    pub fn printable_station(&self) -> bool {
        let second_ok = self.station_code[0] == 0 || self.station_code[0].is_ascii_graphic();
        self.station_code[1].is_ascii_graphic() && second_ok
    }
}

/// The station-matching mode a criterion was compiled for
/// (`vdif_station::type_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdifStation {
    Invalid,
    Numeric(u16),
    OneChar(u8),
    TwoChar(u8, u8),
}

impl VdifStation {
    /// Index into the specialised match-function table (§4.C): matches
    /// `vdif_station::type_type`'s enumerator order.
    pub fn variant_index(&self) -> usize {
        match self {
            VdifStation::Invalid => 0,
            VdifStation::Numeric(_) => 1,
            VdifStation::OneChar(_) => 2,
            VdifStation::TwoChar(..) => 3,
        }
    }
}

/// One thread-id selector within a criterion's comma-separated list
/// (`thread_matcher_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadMatcher {
    Single(u16),
    Range(u16, u16),
}

impl ThreadMatcher {
    pub fn new_single(id: u16) -> Result<Self> {
        if id > MAX_THREAD_ID {
            return Err(DatastreamError::ThreadIdOutOfRange(id));
        }
        Ok(ThreadMatcher::Single(id))
    }

    pub fn new_range(lo: u16, hi: u16) -> Result<Self> {
        if lo > MAX_THREAD_ID || hi > MAX_THREAD_ID {
            return Err(DatastreamError::ThreadIdOutOfRange(lo.max(hi)));
        }
        Ok(ThreadMatcher::Range(lo, hi))
    }

    pub fn matches(&self, thread_id: u16) -> bool {
        match *self {
            ThreadMatcher::Single(t) => t == thread_id,
            ThreadMatcher::Range(lo, hi) => thread_id >= lo && thread_id <= hi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_char_station_is_printable() {
        let key = VdifKey::coded("A", 3, "0.0.0.0:0".parse().unwrap()).unwrap();
        assert!(key.printable_station());
    }

    #[test]
    fn thread_range_matches_inclusive_bounds() {
        let m = ThreadMatcher::new_range(2, 4).unwrap();
        assert!(m.matches(2));
        assert!(m.matches(4));
        assert!(!m.matches(5));
    }

    #[test]
    fn thread_id_out_of_range_is_rejected() {
        assert!(ThreadMatcher::new_single(MAX_THREAD_ID + 1).is_err());
    }
}
