//! Parsing a data stream match criterion string and expanding a data
//! stream name pattern once a key has matched it. Mirrors
//! `mk6info.cc::compile_criteria`'s regex and `replace_fields`.
//!
//! Criterion grammar: `{host|*}{@port|*}/{station|hex|*}.thread-spec`,
//! where `thread-spec` is `*` or a comma-separated list of thread ids or
//! `lo-hi` ranges.

use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DatastreamError, Result};
use crate::key::{ThreadMatcher, VdifKey, VdifStation};

fn criterion_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(([^@/*]+|\*)?(@([0-9]+|\*))?/)?",
            r"(([a-zA-Z]{1,2}|0x[0-9a-fA-F]{1,4}|\*)\.)?",
            r"(\*|[0-9]+(-[0-9]+)?(,[0-9]+(-[0-9]+)?)*)$",
        ))
        .expect("built-in data stream criterion pattern is valid")
    })
}

/// A criterion string decomposed into its matchable fields, ready for
/// `matcher::MatchCriterion` to compile into a dispatch entry.
#[derive(Debug, Clone)]
pub struct ParsedCriterion {
    pub host: Option<Ipv4Addr>,
    pub port: Option<u16>,
    pub station: VdifStation,
    pub threads: Vec<ThreadMatcher>,
}

fn present(m: Option<regex::Match>) -> Option<&str> {
    m.map(|m| m.as_str()).filter(|s| !s.is_empty() && *s != "*")
}

pub fn parse_criterion(text: &str) -> Result<ParsedCriterion> {
    let caps = criterion_regex().captures(text).ok_or_else(|| DatastreamError::InvalidPattern(text.to_string()))?;

    let host = match present(caps.get(2)) {
        Some(h) => Some(h.parse::<Ipv4Addr>().map_err(|_| DatastreamError::InvalidPattern(text.to_string()))?),
        None => None,
    };

    let port = match present(caps.get(4)) {
        Some(p) => Some(p.parse::<u16>().map_err(|_| DatastreamError::PortOutOfRange(p.to_string()))?),
        None => None,
    };

    let station = match present(caps.get(6)) {
        None => VdifStation::Invalid,
        Some(s) if s.starts_with("0x") => {
            let id = u16::from_str_radix(&s[2..], 16).map_err(|_| DatastreamError::InvalidPattern(text.to_string()))?;
            VdifStation::Numeric(id)
        }
        Some(s) if s.len() == 1 => VdifStation::OneChar(s.as_bytes()[0]),
        Some(s) => VdifStation::TwoChar(s.as_bytes()[0], s.as_bytes()[1]),
    };

    let thread_s = caps.get(7).map(|m| m.as_str()).unwrap_or("*");
    let threads = if thread_s == "*" {
        Vec::new()
    } else {
        thread_s
            .split(',')
            .map(|entry| {
                let parts: Vec<u16> = entry
                    .split('-')
                    .map(|p| p.parse::<u16>().map_err(|_| DatastreamError::InvalidPattern(entry.to_string())))
                    .collect::<Result<Vec<_>>>()?;
                match parts.as_slice() {
                    [single] => ThreadMatcher::new_single(*single),
                    [lo, hi] => ThreadMatcher::new_range(*lo, *hi),
                    _ => Err(DatastreamError::InvalidPattern(entry.to_string())),
                }
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(ParsedCriterion { host, port, station, threads })
}

/// Replace `{station}` and `{thread}` placeholders in a data stream name
/// pattern with the values carried by a matched key.
pub fn expand_name(pattern: &str, key: &VdifKey) -> String {
    let mut out = pattern.to_string();
    if out.contains("{thread}") {
        out = out.replace("{thread}", &key.thread_id.to_string());
    }
    if out.contains("{station}") {
        let station = if key.printable_station() {
            let mut s = String::new();
            s.push(key.station_code[1] as char);
            if key.station_code[0] != 0 {
                s.push(key.station_code[0] as char);
            }
            s
        } else {
            format!("{:04x}", key.station_id)
        };
        out = out.replace("{station}", &station);
    }
    out
}
