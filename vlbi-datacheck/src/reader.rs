//! Byte-range reading abstraction (§4.B), matching the original's
//! `file_reader_type`/`streamstor_reader_type`/`vbs_reader_base` family: any
//! source that can report a total length and fill a buffer from an offset.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

pub trait ByteRangeReader {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill as much of `buf` as possible starting at `offset`, returning the
    /// number of bytes actually read (short reads at EOF are not an error).
    fn read_into(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl ByteRangeReader for [u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_into(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ByteRangeReader for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_into(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_into(buf, offset)
    }
}

/// A [`ByteRangeReader`] over a plain on-disk file, seeking per read the way
/// the original's `file_reader_type` does.
pub struct FileByteRangeReader {
    file: std::sync::Mutex<File>,
    length: u64,
}

impl FileByteRangeReader {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();
        Ok(FileByteRangeReader { file: std::sync::Mutex::new(file), length })
    }
}

impl ByteRangeReader for FileByteRangeReader {
    fn len(&self) -> u64 {
        self.length
    }

    fn read_into(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut file = self.file.lock().expect("file reader mutex poisoned");
        file.seek(SeekFrom::Start(offset))?;
        let mut total = 0usize;
        loop {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
            if total == buf.len() {
                break;
            }
        }
        Ok(total)
    }
}
