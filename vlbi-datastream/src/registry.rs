//! Defined data streams and the classifier that assigns a stable id to
//! each distinct VDIF key, mirroring `mk6info.cc::datastream_mgmt_type`.
//!
//! Streams are kept in definition (insertion) order, exactly as
//! `defined_datastreams` is walked top to bottom looking for the first
//! criterion that matches; once a key has been classified, the id is
//! cached so repeat lookups skip the scan entirely.

use std::collections::HashMap;
use std::net::SocketAddrV4;
use std::sync::RwLock;

use crate::error::{DatastreamError, Result};
use crate::key::VdifKey;
use crate::matcher::MatchCriterion;
use crate::pattern::{expand_name, parse_criterion};

pub type DatastreamId = u32;

struct Datastream {
    name_pattern: String,
    criteria: Vec<MatchCriterion>,
}

/// The set of currently-defined data streams plus the name/id caches
/// built up as keys are classified against them.
pub struct DatastreamRegistry {
    defined: Vec<Datastream>,
    name2id: RwLock<HashMap<String, DatastreamId>>,
    id2name: RwLock<HashMap<DatastreamId, String>>,
    key2id: RwLock<HashMap<VdifKey, DatastreamId>>,
}

impl Default for DatastreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DatastreamRegistry {
    pub fn new() -> Self {
        DatastreamRegistry {
            defined: Vec::new(),
            name2id: RwLock::new(HashMap::new()),
            id2name: RwLock::new(HashMap::new()),
            key2id: RwLock::new(HashMap::new()),
        }
    }

    /// Define a new data stream: `name_pattern` may contain `{station}`
    /// and `{thread}` placeholders, `criteria_text` is the list of
    /// criterion strings any of which selects this stream.
    pub fn define(&mut self, name_pattern: &str, criteria_text: &[String]) -> Result<()> {
        if self.defined.iter().any(|d| d.name_pattern == name_pattern) {
            return Err(DatastreamError::DuplicateName(name_pattern.to_string()));
        }
        let criteria = criteria_text
            .iter()
            .map(|text| {
                let parsed = parse_criterion(text)?;
                Ok(MatchCriterion {
                    origin_addr: parsed.host.unwrap_or(std::net::Ipv4Addr::UNSPECIFIED),
                    origin_port: parsed.port.unwrap_or(0),
                    match_ip: parsed.host.is_some(),
                    match_port: parsed.port.is_some(),
                    station: parsed.station,
                    threads: parsed.threads,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.defined.push(Datastream { name_pattern: name_pattern.to_string(), criteria });
        Ok(())
    }

    pub fn remove(&mut self, name_pattern: &str) -> Result<()> {
        let idx = self
            .defined
            .iter()
            .position(|d| d.name_pattern == name_pattern)
            .ok_or_else(|| DatastreamError::Undefined(name_pattern.to_string()))?;
        self.defined.remove(idx);
        Ok(())
    }

    /// Drop the learned name/id/key caches without forgetting the
    /// defined streams themselves (`datastream_mgmt_type::reset`).
    pub fn reset(&self) {
        self.key2id.write().unwrap().clear();
        self.name2id.write().unwrap().clear();
        self.id2name.write().unwrap().clear();
    }

    pub fn clear(&mut self) {
        self.reset();
        self.defined.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defined.len()
    }

    /// Look up (or assign and cache) the data stream id for a VDIF key,
    /// by station/thread id with no per-sender origin information.
    pub fn classify_vdif(&self, station_id: u16, thread_id: u16) -> Result<DatastreamId> {
        self.classify(VdifKey::numeric(station_id, thread_id, SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, 0)))
    }

    pub fn classify(&self, key: VdifKey) -> Result<DatastreamId> {
        if let Some(&id) = self.key2id.read().unwrap().get(&key) {
            return Ok(id);
        }

        let stream = self
            .defined
            .iter()
            .find(|d| d.criteria.iter().any(|c| c.matches(&key)))
            .ok_or(DatastreamError::NoMatch { station_id: key.station_id, thread_id: key.thread_id })?;

        let name = expand_name(&stream.name_pattern, &key);
        let id = {
            let mut name2id = self.name2id.write().unwrap();
            if let Some(&id) = name2id.get(&name) {
                id
            } else {
                let id = name2id.len() as DatastreamId;
                name2id.insert(name.clone(), id);
                self.id2name.write().unwrap().insert(id, name);
                id
            }
        };
        self.key2id.write().unwrap().insert(key, id);
        Ok(id)
    }

    pub fn streamid2name(&self, id: DatastreamId) -> String {
        self.id2name.read().unwrap().get(&id).cloned().unwrap_or_default()
    }
}
