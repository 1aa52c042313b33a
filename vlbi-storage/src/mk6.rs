//! Mark6 on-disk container format (§6.2, §3.4): a file begins with one
//! [`Mk6FileHeader`], then a sequence of blocks each prefixed with a
//! [`Mk6BlockHeaderV2`]. Multiple chunks of the same recording can share
//! one file, so the reader keeps one fd per file and hands out byte
//! ranges within it rather than opening per-chunk.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use crate::chunk::{ChunkLocation, FileChunk, SuffixInterner};
use crate::error::{Result, StorageError};

pub const MK6_SYNC_WORD: u32 = 0xfeed_6666;
pub const MK6_VERSION: u32 = 2;
pub const MK6_FILE_HEADER_SIZE: usize = 16;
pub const MK6_BLOCK_HEADER_SIZE: usize = 8;
pub const MK6_MIN_BLOCK_SIZE: u64 = 8 * 1024 * 1024;

/// `mk6_file_header` (§3.4): little-endian, fixed 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Mk6FileHeader {
    pub sync: u32,
    pub version: u32,
    pub block_size: u32,
    pub packet_format: u16,
    pub packet_size: u16,
}

impl Mk6FileHeader {
    pub fn new(block_size: u32, packet_format: u16, packet_size: u16) -> Self {
        Mk6FileHeader { sync: MK6_SYNC_WORD, version: MK6_VERSION, block_size, packet_format, packet_size }
    }

    pub fn to_bytes(&self) -> [u8; MK6_FILE_HEADER_SIZE] {
        let mut buf = [0u8; MK6_FILE_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.sync.to_le_bytes());
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.block_size.to_le_bytes());
        buf[12..14].copy_from_slice(&self.packet_format.to_le_bytes());
        buf[14..16].copy_from_slice(&self.packet_size.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < MK6_FILE_HEADER_SIZE {
            return Err(StorageError::NotMark6("truncated file header".into()));
        }
        let sync = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        if sync != MK6_SYNC_WORD || version != MK6_VERSION {
            return Err(StorageError::NotMark6("bad magic or unsupported version".into()));
        }
        Ok(Mk6FileHeader {
            sync,
            version,
            block_size: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            packet_format: u16::from_le_bytes(buf[12..14].try_into().unwrap()),
            packet_size: u16::from_le_bytes(buf[14..16].try_into().unwrap()),
        })
    }
}

/// `mk6_block_header_v2` (§3.4): little-endian, fixed 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Mk6BlockHeaderV2 {
    pub block_number: u32,
    pub block_size_including_header: u32,
}

impl Mk6BlockHeaderV2 {
    pub fn to_bytes(&self) -> [u8; MK6_BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; MK6_BLOCK_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.block_number.to_le_bytes());
        buf[4..8].copy_from_slice(&self.block_size_including_header.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < MK6_BLOCK_HEADER_SIZE {
            return Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated block header")));
        }
        Ok(Mk6BlockHeaderV2 {
            block_number: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            block_size_including_header: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }

    pub fn payload_size(&self) -> u32 {
        self.block_size_including_header - MK6_BLOCK_HEADER_SIZE as u32
    }
}

fn mk6_filename_pattern(recording_stem: &str) -> Result<Regex> {
    Regex::new(&format!("^{}(_ds[^.]+)?$", regex::escape(recording_stem))).map_err(|_| StorageError::InvalidPattern(recording_stem.to_string()))
}

/// Scan one Mark6 file, verifying its magic/version and splitting it
/// into chunks at each block boundary (§4.D).
pub fn scan_mk6_file(path: &Path, recording_stem: &str, interner: &SuffixInterner) -> Result<Vec<FileChunk>> {
    let mut file = File::open(path)?;
    let mut header_buf = [0u8; MK6_FILE_HEADER_SIZE];
    file.read_exact(&mut header_buf)?;
    Mk6FileHeader::from_bytes(&header_buf)?;

    let suffix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix(recording_stem))
        .and_then(|s| s.strip_prefix("_ds"))
        .unwrap_or("");
    let suffix_id = interner.intern(suffix);

    let shared_path = Arc::new(path.to_path_buf());
    let mut chunks = Vec::new();
    let mut position = file.stream_position()?;
    let mut block_number = 0u32;

    loop {
        let mut hdr_buf = [0u8; MK6_BLOCK_HEADER_SIZE];
        match file.read_exact(&mut hdr_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let block_header = Mk6BlockHeaderV2::from_bytes(&hdr_buf)?;
        let payload_offset = position + MK6_BLOCK_HEADER_SIZE as u64;
        chunks.push(FileChunk {
            recording_stem: recording_stem.to_string(),
            chunk_number: block_header.block_number,
            suffix_id,
            location: ChunkLocation::Mk6Block { path: Arc::clone(&shared_path), file_offset: payload_offset },
            size: block_header.payload_size() as u64,
            logical_offset: 0,
        });
        position += block_header.block_size_including_header as u64;
        block_number += 1;
        file.seek(SeekFrom::Start(position))?;
    }
    log::debug!("scanned {} Mark6 blocks from {}", block_number, path.display());
    Ok(chunks)
}

/// Scan every file under `mountpoint` matching the recording's name
/// pattern (one worker per mountpoint in the original; this crate
/// leaves the fan-out to the caller, see `writer.rs`/`vlbi-chain`).
pub fn scan_mountpoint(mountpoint: &Path, recording_stem: &str, interner: &SuffixInterner) -> Result<Vec<FileChunk>> {
    let pattern = mk6_filename_pattern(recording_stem)?;
    let mut chunks = Vec::new();
    for entry in std::fs::read_dir(mountpoint)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if pattern.is_match(&name) {
            chunks.extend(scan_mk6_file(&entry.path(), recording_stem, interner)?);
        }
    }
    Ok(chunks)
}

/// Mark6 file descriptors are shared across all chunks from the same
/// file; `OpenFile::close` collects unique paths into this set before
/// actually dropping the underlying `File` handles.
pub fn unique_paths(chunks: &[FileChunk]) -> HashMap<PathBuf, ()> {
    let mut seen = HashMap::new();
    for chunk in chunks {
        if let ChunkLocation::Mk6Block { path, .. } = &chunk.location {
            seen.entry(path.as_ref().clone()).or_insert(());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_header_round_trips() {
        let h = Mk6FileHeader::new(8 * 1024 * 1024, 1, 8224);
        let bytes = h.to_bytes();
        assert_eq!(Mk6FileHeader::from_bytes(&bytes).unwrap(), h);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = Mk6FileHeader::new(1, 1, 1).to_bytes();
        bytes[0] = 0;
        assert!(Mk6FileHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn block_header_payload_size_excludes_header() {
        let h = Mk6BlockHeaderV2 { block_number: 3, block_size_including_header: 1000 };
        assert_eq!(h.payload_size(), 1000 - MK6_BLOCK_HEADER_SIZE as u32);
    }
}
