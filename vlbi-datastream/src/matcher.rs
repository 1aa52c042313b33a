//! Compiled match criteria and the specialised dispatch table that picks
//! the right matching function for a criterion's (ip, port, station-mode)
//! combination, mirroring `mk6info.cc`'s `matchmap_type`/`_m_*` family —
//! one function per combination rather than branching on every key.

use std::net::Ipv4Addr;

use crate::key::{ThreadMatcher, VdifKey, VdifStation};

/// A compiled criterion: one entry in a data stream's match-criteria list.
#[derive(Debug, Clone)]
pub struct MatchCriterion {
    pub origin_addr: Ipv4Addr,
    pub origin_port: u16,
    pub match_ip: bool,
    pub match_port: bool,
    pub station: VdifStation,
    pub threads: Vec<ThreadMatcher>,
}

impl MatchCriterion {
    pub fn matches(&self, key: &VdifKey) -> bool {
        MATCH_TABLE[self.match_ip as usize][self.match_port as usize][self.station.variant_index()](key, self)
    }

    fn threads_match(&self, key: &VdifKey) -> bool {
        self.threads.is_empty() || self.threads.iter().any(|t| t.matches(key.thread_id))
    }
}

fn station_matches(station: &VdifStation, key: &VdifKey) -> bool {
    match *station {
        VdifStation::Invalid => true,
        VdifStation::Numeric(id) => key.station_id == id,
        VdifStation::OneChar(c) => key.station_code[1] == c,
        VdifStation::TwoChar(c0, c1) => key.station_code[1] == c0 && key.station_code[0] == c1,
    }
}

type MatchFn = fn(&VdifKey, &MatchCriterion) -> bool;

// Neither IP nor port.
fn m_false_false_invalid(key: &VdifKey, m: &MatchCriterion) -> bool {
    m.threads_match(key)
}
fn m_false_false_numeric(key: &VdifKey, m: &MatchCriterion) -> bool {
    station_matches(&m.station, key) && m.threads_match(key)
}
fn m_false_false_one_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    station_matches(&m.station, key) && m.threads_match(key)
}
fn m_false_false_two_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    station_matches(&m.station, key) && m.threads_match(key)
}

// IP only.
fn m_true_false_invalid(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr && m.threads_match(key)
}
fn m_true_false_numeric(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr && station_matches(&m.station, key) && m.threads_match(key)
}
fn m_true_false_one_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr && station_matches(&m.station, key) && m.threads_match(key)
}
fn m_true_false_two_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr && station_matches(&m.station, key) && m.threads_match(key)
}

// IP and port.
fn m_true_true_invalid(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr && key.origin_port == m.origin_port && m.threads_match(key)
}
fn m_true_true_numeric(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr
        && key.origin_port == m.origin_port
        && station_matches(&m.station, key)
        && m.threads_match(key)
}
fn m_true_true_one_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr
        && key.origin_port == m.origin_port
        && station_matches(&m.station, key)
        && m.threads_match(key)
}
fn m_true_true_two_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_addr == m.origin_addr
        && key.origin_port == m.origin_port
        && station_matches(&m.station, key)
        && m.threads_match(key)
}

// Port only.
fn m_false_true_invalid(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_port == m.origin_port && m.threads_match(key)
}
fn m_false_true_numeric(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_port == m.origin_port && station_matches(&m.station, key) && m.threads_match(key)
}
fn m_false_true_one_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_port == m.origin_port && station_matches(&m.station, key) && m.threads_match(key)
}
fn m_false_true_two_char(key: &VdifKey, m: &MatchCriterion) -> bool {
    key.origin_port == m.origin_port && station_matches(&m.station, key) && m.threads_match(key)
}

/// Indexed `[match_ip][match_port][station.variant_index()]`.
static MATCH_TABLE: [[[MatchFn; 4]; 2]; 2] = [
    [
        [m_false_false_invalid, m_false_false_numeric, m_false_false_one_char, m_false_false_two_char],
        [m_false_true_invalid, m_false_true_numeric, m_false_true_one_char, m_false_true_two_char],
    ],
    [
        [m_true_false_invalid, m_true_false_numeric, m_true_false_one_char, m_true_false_two_char],
        [m_true_true_invalid, m_true_true_numeric, m_true_true_one_char, m_true_true_two_char],
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddrV4;

    fn key(code: &str, thread_id: u16, addr: &str) -> VdifKey {
        VdifKey::coded(code, thread_id, addr.parse::<SocketAddrV4>().unwrap()).unwrap()
    }

    #[test]
    fn wildcard_criterion_matches_anything() {
        let c = MatchCriterion {
            origin_addr: Ipv4Addr::UNSPECIFIED,
            origin_port: 0,
            match_ip: false,
            match_port: false,
            station: VdifStation::Invalid,
            threads: Vec::new(),
        };
        assert!(c.matches(&key("Wb", 3, "1.2.3.4:9000")));
    }

    #[test]
    fn station_and_ip_must_both_match() {
        let c = MatchCriterion {
            origin_addr: "1.2.3.4".parse().unwrap(),
            origin_port: 0,
            match_ip: true,
            match_port: false,
            station: VdifStation::TwoChar(b'W', b'b'),
            threads: Vec::new(),
        };
        assert!(c.matches(&key("Wb", 3, "1.2.3.4:9000")));
        assert!(!c.matches(&key("Wb", 3, "5.6.7.8:9000")));
        assert!(!c.matches(&key("Ef", 3, "1.2.3.4:9000")));
    }

    #[test]
    fn thread_restriction_is_enforced_when_given() {
        let c = MatchCriterion {
            origin_addr: Ipv4Addr::UNSPECIFIED,
            origin_port: 0,
            match_ip: false,
            match_port: false,
            station: VdifStation::Invalid,
            threads: vec![ThreadMatcher::Single(2)],
        };
        assert!(c.matches(&key("Wb", 2, "1.2.3.4:9000")));
        assert!(!c.matches(&key("Wb", 3, "1.2.3.4:9000")));
    }
}
