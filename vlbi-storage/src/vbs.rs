//! FlexBuff/VBS on-disk layout (§6.3, §3.4): one directory per
//! recording (optionally suffixed `_ds<suffix>` for concurrent
//! datastreams), containing one file per chunk named with an 8-digit
//! decimal chunk number.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::chunk::{ChunkLocation, FileChunk, SuffixInterner};
use crate::error::{Result, StorageError};

fn recording_dir_pattern(recording_stem: &str) -> Result<Regex> {
    Regex::new(&format!("^{}(_ds(?P<suffix>[^/]+))?$", regex::escape(recording_stem)))
        .map_err(|_| StorageError::InvalidPattern(recording_stem.to_string()))
}

fn chunk_file_pattern(dir_name: &str) -> Result<Regex> {
    Regex::new(&format!("^{}\\.(?P<chunk>[0-9]{{8}})$", regex::escape(dir_name)))
        .map_err(|_| StorageError::InvalidPattern(dir_name.to_string()))
}

/// Scan one mountpoint for every FlexBuff chunk belonging to
/// `recording_stem`, across every datastream suffix directory found.
pub fn scan_mountpoint(mountpoint: &Path, recording_stem: &str, interner: &SuffixInterner) -> Result<Vec<FileChunk>> {
    let dir_pattern = recording_dir_pattern(recording_stem)?;
    let mut chunks = Vec::new();

    let entries = match fs::read_dir(mountpoint) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let dir_name = entry.file_name();
        let dir_name = dir_name.to_string_lossy();
        let caps = match dir_pattern.captures(&dir_name) {
            Some(c) => c,
            None => continue,
        };
        let suffix = caps.name("suffix").map(|m| m.as_str()).unwrap_or("");
        let suffix_id = interner.intern(suffix);

        let file_pattern = chunk_file_pattern(&dir_name)?;
        for chunk_entry in fs::read_dir(entry.path())? {
            let chunk_entry = chunk_entry?;
            let file_name = chunk_entry.file_name();
            let file_name = file_name.to_string_lossy();
            let caps = match file_pattern.captures(&file_name) {
                Some(c) => c,
                None => continue,
            };
            let chunk_number: u32 = caps["chunk"].parse().expect("regex guarantees 8 decimal digits");
            let size = chunk_entry.metadata()?.len();
            chunks.push(FileChunk {
                recording_stem: recording_stem.to_string(),
                chunk_number,
                suffix_id,
                location: ChunkLocation::File { path: chunk_entry.path() },
                size,
                logical_offset: 0,
            });
        }
    }
    Ok(chunks)
}

/// Reject duplicate `(chunk_number, suffix_id)` pairs across a combined
/// scan of every mountpoint, as the original's insert-into-map check
/// does for the same case.
pub fn check_no_duplicates(chunks: &[FileChunk]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for chunk in chunks {
        if !seen.insert(chunk.sort_key()) {
            return Err(StorageError::DuplicateChunk {
                recording: chunk.recording_stem.clone(),
                chunk_number: chunk.chunk_number,
                suffix_id: chunk.suffix_id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir, File};
    use std::io::Write;

    #[test]
    fn finds_chunks_in_a_plain_recording_directory() {
        let dir = tempfile::tempdir().unwrap();
        let rec_dir = dir.path().join("exp1_wb");
        create_dir(&rec_dir).unwrap();
        let mut f = File::create(rec_dir.join("exp1_wb.00000000")).unwrap();
        f.write_all(b"hello").unwrap();

        let interner = SuffixInterner::new();
        let chunks = scan_mountpoint(dir.path(), "exp1_wb", &interner).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_number, 0);
        assert_eq!(chunks[0].size, 5);
    }

    #[test]
    fn finds_chunks_across_datastream_suffix_directories() {
        let dir = tempfile::tempdir().unwrap();
        for suffix_dir in ["exp1_wb", "exp1_wb_ds1"] {
            let rec_dir = dir.path().join(suffix_dir);
            create_dir(&rec_dir).unwrap();
            File::create(rec_dir.join(format!("{suffix_dir}.00000001"))).unwrap();
        }
        let interner = SuffixInterner::new();
        let chunks = scan_mountpoint(dir.path(), "exp1_wb", &interner).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_ne!(chunks[0].suffix_id, chunks[1].suffix_id);
    }

    #[test]
    fn duplicate_chunk_numbers_are_rejected() {
        let a = FileChunk {
            recording_stem: "x".into(),
            chunk_number: 0,
            suffix_id: 0,
            location: ChunkLocation::File { path: "a".into() },
            size: 1,
            logical_offset: 0,
        };
        let b = FileChunk { chunk_number: 0, suffix_id: 0, ..a.clone() };
        assert!(check_no_duplicates(&[a, b]).is_err());
    }
}
