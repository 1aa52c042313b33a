//! Virtual seekable file over a set of striped chunks (§3.4, §4.D):
//! `OpenFile` presents one `Read + Seek` surface regardless of whether
//! the chunks came from a FlexBuff directory or a Mark6 container.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::chunk::{ChunkLocation, FileChunk};
use crate::error::{Result, StorageError};

/// A virtual file assembled from sorted chunks (§3.4 `openfile`).
pub struct OpenFile {
    chunks: Vec<FileChunk>,
    file_size: u64,
    file_pointer: u64,
    cursor: usize,
    /// FlexBuff chunks each own a private fd; Mark6 chunks share one per
    /// physical file. Keyed by chunk index so the cursor chunk's handle
    /// is found in O(1).
    open_files: HashMap<std::path::PathBuf, File>,
}

impl OpenFile {
    /// Build a virtual file from discovered chunks: sort by
    /// `(chunk_number, suffix_id)` and assign logical offsets as the
    /// running size sum (§3.4 invariant).
    pub fn new(mut chunks: Vec<FileChunk>) -> Self {
        chunks.sort_by_key(|c| c.sort_key());
        let mut offset = 0u64;
        for chunk in chunks.iter_mut() {
            chunk.logical_offset = offset;
            offset += chunk.size;
        }
        OpenFile { chunks, file_size: offset, file_pointer: 0, cursor: 0, open_files: HashMap::new() }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn file_pointer(&self) -> u64 {
        self.file_pointer
    }

    fn locate_chunk(&self, file_pointer: u64) -> usize {
        if file_pointer >= self.file_size {
            return self.chunks.len().saturating_sub(1);
        }
        self.chunks.iter().position(|c| c.contains(file_pointer)).unwrap_or(0)
    }

    fn path_for(chunk: &FileChunk) -> &std::path::Path {
        match &chunk.location {
            ChunkLocation::File { path } => path.as_path(),
            ChunkLocation::Mk6Block { path, .. } => path.as_path(),
        }
    }

    fn physical_offset(chunk: &FileChunk, within_chunk: u64) -> u64 {
        match &chunk.location {
            ChunkLocation::File { .. } => within_chunk,
            ChunkLocation::Mk6Block { file_offset, .. } => file_offset + within_chunk,
        }
    }

    fn handle_for(&mut self, chunk_idx: usize) -> Result<&mut File> {
        let path = Self::path_for(&self.chunks[chunk_idx]).to_path_buf();
        if !self.open_files.contains_key(&path) {
            let file = File::open(&path)?;
            self.open_files.insert(path.clone(), file);
        }
        Ok(self.open_files.get_mut(&path).unwrap())
    }

    /// Starting from the cursor chunk, read up to `buf.len()` bytes;
    /// advance across chunk boundaries, closing FlexBuff chunks' private
    /// fds as they're left behind (Mark6 fds are shared and stay open).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() && self.file_pointer < self.file_size {
            self.cursor = self.locate_chunk(self.file_pointer);
            let chunk = self.chunks[self.cursor].clone();
            let within_chunk = self.file_pointer - chunk.logical_offset;
            let remaining_in_chunk = chunk.size - within_chunk;
            let want = (buf.len() - total) as u64;
            let take = want.min(remaining_in_chunk) as usize;

            let physical = Self::physical_offset(&chunk, within_chunk);
            let handle = self.handle_for(self.cursor)?;
            handle.seek(SeekFrom::Start(physical))?;
            let n = handle.read(&mut buf[total..total + take])?;
            if n == 0 {
                break; // physical EOF short of the chunk's recorded size
            }
            total += n;
            self.file_pointer += n as u64;

            if matches!(chunk.location, ChunkLocation::File { .. }) && self.file_pointer >= chunk.logical_offset + chunk.size {
                self.open_files.remove(Self::path_for(&chunk));
            }
        }
        Ok(total)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(n) => self.file_pointer as i64 + n,
            SeekFrom::End(n) => self.file_size as i64 + n,
        };
        if target < 0 {
            return Err(StorageError::InvalidSeek);
        }
        let target = target as u64;
        let previous_cursor = self.cursor;
        self.file_pointer = target;
        self.cursor = self.locate_chunk(target);
        if previous_cursor != self.cursor {
            if let Some(prev) = self.chunks.get(previous_cursor) {
                if matches!(prev.location, ChunkLocation::File { .. }) {
                    self.open_files.remove(Self::path_for(prev));
                }
            }
        }
        Ok(target)
    }

    /// Destruct the virtual file: FlexBuff fds were already closed as
    /// their chunks were left behind; Mark6 fds (shared per file) are
    /// closed once each here.
    pub fn close(mut self) -> Result<()> {
        self.open_files.clear();
        Ok(())
    }
}

/// Synthetic negative file descriptor handed out to callers in place of
/// a real OS fd (§4.D "Virtual-file opening").
pub type VirtualFd = i64;

/// Process-wide table of currently open virtual files, guarded the same
/// way `vlbi-chain`'s shared state is (§5): a `parking_lot::RwLock`
/// rather than `std::sync`, so the same lock primitive backs every
/// shared table across this workspace.
#[derive(Default)]
pub struct OpenFileTable {
    files: RwLock<HashMap<VirtualFd, Arc<parking_lot::Mutex<OpenFile>>>>,
    next_fd: std::sync::atomic::AtomicI64,
}

impl OpenFileTable {
    pub fn new() -> Self {
        OpenFileTable { files: RwLock::new(HashMap::new()), next_fd: std::sync::atomic::AtomicI64::new(-1) }
    }

    pub fn insert(&self, file: OpenFile) -> VirtualFd {
        let fd = self.next_fd.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        self.files.write().insert(fd, Arc::new(parking_lot::Mutex::new(file)));
        fd
    }

    pub fn get(&self, fd: VirtualFd) -> Option<Arc<parking_lot::Mutex<OpenFile>>> {
        self.files.read().get(&fd).cloned()
    }

    pub fn remove(&self, fd: VirtualFd) -> Option<Arc<parking_lot::Mutex<OpenFile>>> {
        self.files.write().remove(&fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_chunk(dir: &std::path::Path, name: &str, contents: &[u8]) -> FileChunk {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        FileChunk {
            recording_stem: "rec".into(),
            chunk_number: name.len() as u32,
            suffix_id: 0,
            location: ChunkLocation::File { path },
            size: contents.len() as u64,
            logical_offset: 0,
        }
    }

    #[test]
    fn reads_sequentially_across_chunk_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_chunk(dir.path(), "a", b"hello");
        let b = write_chunk(dir.path(), "bb", b"world");
        let mut file = OpenFile::new(vec![a, b]);
        assert_eq!(file.file_size(), 10);

        let mut buf = vec![0u8; 10];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&buf, b"helloworld");
    }

    #[test]
    fn seek_relocates_the_cursor_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_chunk(dir.path(), "a", b"hello");
        let b = write_chunk(dir.path(), "bb", b"world");
        let mut file = OpenFile::new(vec![a, b]);

        file.seek(SeekFrom::Start(7)).unwrap();
        let mut buf = vec![0u8; 3];
        file.read(&mut buf).unwrap();
        assert_eq!(&buf, b"rld");
    }

    #[test]
    fn negative_seek_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_chunk(dir.path(), "a", b"hello");
        let mut file = OpenFile::new(vec![a]);
        assert!(file.seek(SeekFrom::Current(-1)).is_err());
    }
}
