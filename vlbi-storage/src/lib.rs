//! Striped recording storage (§3.4/§4.D): discover mountpoints, scan
//! them for the chunks of a named recording in either the FlexBuff/VBS
//! or Mark6 on-disk layout, and present the result as one virtual
//! `Read + Seek` file. Also covers the write path: a striped fan-out
//! writer and pre-existing-scan name disambiguation.

pub mod chunk;
pub mod error;
pub mod mk6;
pub mod mountpoint;
pub mod openfile;
pub mod scanname;
pub mod vbs;
pub mod writer;

pub use chunk::{ChunkLocation, FileChunk, SuffixInterner};
pub use error::{Result, StorageError};
pub use mountpoint::{builtin_group, find_mountpoints, MountpointPattern};
pub use openfile::{OpenFile, OpenFileTable, VirtualFd};
