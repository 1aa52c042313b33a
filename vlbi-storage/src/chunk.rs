//! A single piece of a striped recording (§3.4) and the process-wide
//! table that turns a chunk's textual suffix (the `_ds<suffix>` part of
//! a FlexBuff directory/file name) into a small, comparable id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Where a chunk's bytes physically live.
#[derive(Debug, Clone)]
pub enum ChunkLocation {
    /// FlexBuff layout: one file per chunk, owns its own fd.
    File { path: std::path::PathBuf },
    /// Mark6 layout: a byte range within a file shared by other chunks.
    Mk6Block { path: Arc<std::path::PathBuf>, file_offset: u64 },
}

/// One piece of a recording (§3.4 `filechunk`).
#[derive(Debug, Clone)]
pub struct FileChunk {
    pub recording_stem: String,
    pub chunk_number: u32,
    pub suffix_id: u32,
    pub location: ChunkLocation,
    pub size: u64,
    /// Offset of this chunk's first byte within the virtual file; the
    /// running sum of every earlier chunk's size (invariant, §3.4).
    pub logical_offset: u64,
}

impl FileChunk {
    pub fn sort_key(&self) -> (u32, u32) {
        (self.chunk_number, self.suffix_id)
    }

    pub fn contains(&self, file_pointer: u64) -> bool {
        file_pointer >= self.logical_offset && file_pointer < self.logical_offset + self.size
    }
}

/// Assigns small, stable integer ids to datastream suffix strings
/// (`_ds<suffix>`), shared across every mountpoint scan in the process.
#[derive(Debug, Default)]
pub struct SuffixInterner {
    inner: Mutex<HashMap<String, u32>>,
}

impl SuffixInterner {
    pub fn new() -> Self {
        SuffixInterner { inner: Mutex::new(HashMap::new()) }
    }

    /// The empty suffix (no `_ds<suffix>` present) always interns to 0.
    pub fn intern(&self, suffix: &str) -> u32 {
        if suffix.is_empty() {
            return 0;
        }
        let mut map = self.inner.lock();
        let next = map.len() as u32 + 1;
        *map.entry(suffix.to_string()).or_insert(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_suffix_is_always_zero() {
        let interner = SuffixInterner::new();
        assert_eq!(interner.intern(""), 0);
        assert_eq!(interner.intern(""), 0);
    }

    #[test]
    fn distinct_suffixes_get_distinct_stable_ids() {
        let interner = SuffixInterner::new();
        let a = interner.intern("ds1");
        let b = interner.intern("ds2");
        assert_ne!(a, b);
        assert_eq!(interner.intern("ds1"), a);
    }
}
