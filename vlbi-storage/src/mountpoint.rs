//! Mountpoint discovery (§4.D): turn a user-supplied list of shell-glob
//! or regex patterns into the set of directories recordings may live
//! under, filtering out anything that turns out to live on the root
//! filesystem (mirrors `mountpoint.cc`'s `/etc/mtab` cross-check).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern as GlobPattern;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Result, StorageError};

/// One mountpoint-discovery pattern: either a shell glob or a regex,
/// the way `mountpoint.cc` accepts either `fnmatch`- or `regcomp`-style
/// expressions depending on whether the string looks like a plain glob.
#[derive(Debug, Clone)]
pub enum MountpointPattern {
    Glob(GlobPattern),
    Regex(Regex),
}

impl MountpointPattern {
    pub fn parse(text: &str) -> Result<Self> {
        if text.contains("(?") || text.contains('^') || text.contains('$') {
            return Regex::new(text).map(MountpointPattern::Regex).map_err(|_| StorageError::InvalidPattern(text.to_string()));
        }
        GlobPattern::new(text).map(MountpointPattern::Glob).map_err(|_| StorageError::InvalidPattern(text.to_string()))
    }

    /// The longest path prefix that contains no glob/regex metacharacters,
    /// used as the root to start walking from instead of the filesystem root.
    fn constant_prefix(&self) -> PathBuf {
        let text = match self {
            MountpointPattern::Glob(p) => p.as_str(),
            MountpointPattern::Regex(r) => r.as_str(),
        };
        let stop = text.find(|c: char| "*?[{(^$\\".contains(c)).unwrap_or(text.len());
        let prefix = &text[..stop];
        let prefix = match prefix.rfind('/') {
            Some(idx) => &prefix[..=idx],
            None => "",
        };
        if prefix.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(prefix)
        }
    }

    fn matches(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        match self {
            MountpointPattern::Glob(p) => p.matches(&text),
            MountpointPattern::Regex(r) => r.is_match(&text),
        }
    }
}

/// Builtin mountpoint groups for the two recording layouts (§4.D).
pub fn builtin_group(name: &str) -> Vec<String> {
    match name {
        "mk6" => (1..=4).map(|n| format!("/mnt/disks/{n}/*/*")).collect(),
        "flexbuf" => (0..=15).map(|n| format!("/mnt/disks/{n}")).collect(),
        _ => Vec::new(),
    }
}

/// Does `path` live on the root filesystem, per `/proc/mounts`? A
/// directory created directly under `/` with no separate mount is
/// excluded from recording storage (§4.D) because writes there would
/// fill up the system disk rather than a dedicated recording volume.
#[cfg(target_os = "linux")]
fn is_on_root_filesystem(path: &Path) -> bool {
    use std::fs;

    let mounts = match fs::read_to_string("/proc/mounts") {
        Ok(s) => s,
        Err(_) => return false,
    };
    let mut best_match: Option<&str> = None;
    for line in mounts.lines() {
        let mountpoint = match line.split_whitespace().nth(1) {
            Some(m) => m,
            None => continue,
        };
        if path.starts_with(mountpoint) {
            if best_match.map(|b| mountpoint.len() > b.len()).unwrap_or(true) {
                best_match = Some(mountpoint);
            }
        }
    }
    matches!(best_match, Some("/") | None)
}

#[cfg(not(target_os = "linux"))]
fn is_on_root_filesystem(_path: &Path) -> bool {
    false
}

/// Walk the filesystem from each pattern's constant prefix, collecting
/// every matching directory not on the root filesystem.
pub fn find_mountpoints(patterns: &[MountpointPattern]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for pattern in patterns {
        let root = pattern.constant_prefix();
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            if !pattern.matches(path) {
                continue;
            }
            if is_on_root_filesystem(path) {
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                result.push(path.to_path_buf());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_pattern_parses_and_matches() {
        let p = MountpointPattern::parse("/mnt/disk*/data").unwrap();
        assert!(p.matches(Path::new("/mnt/disk1/data")));
        assert!(!p.matches(Path::new("/mnt/other/data")));
    }

    #[test]
    fn constant_prefix_stops_at_first_metacharacter() {
        let p = MountpointPattern::parse("/mnt/disk*/data").unwrap();
        assert_eq!(p.constant_prefix(), PathBuf::from("/mnt/"));
    }

    #[test]
    fn builtin_groups_are_nonempty() {
        assert!(!builtin_group("mk6").is_empty());
        assert!(!builtin_group("flexbuf").is_empty());
        assert!(builtin_group("unknown").is_empty());
    }
}
