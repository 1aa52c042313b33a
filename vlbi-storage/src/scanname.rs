//! Pre-existing-scan checking (§4.D "Scan name management"): before
//! opening a new recording, make sure its name doesn't collide with one
//! already present on any mountpoint, appending a single-letter suffix
//! (`a..z` then `A..Z`) when it does.

use std::path::Path;

use regex::Regex;

use crate::error::{Result, StorageError};

const SUFFIXES: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Scan every mountpoint for entries matching `^scanname([a-zA-Z])?$`
/// and return the set of suffixes already taken (`""` meaning the bare
/// name itself is taken).
pub fn taken_suffixes(mountpoints: &[impl AsRef<Path>], scanname: &str) -> Result<std::collections::HashSet<String>> {
    let pattern = Regex::new(&format!("^{}([a-zA-Z])?$", regex::escape(scanname))).map_err(|_| StorageError::InvalidPattern(scanname.to_string()))?;
    let mut taken = std::collections::HashSet::new();

    for mountpoint in mountpoints {
        let entries = match std::fs::read_dir(mountpoint.as_ref()) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(caps) = pattern.captures(&name) {
                taken.insert(caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default());
            }
        }
    }
    Ok(taken)
}

/// Pick the name to record a new scan under: the bare `scanname` if no
/// entry by that name exists anywhere, else the first unused
/// `a..z, A..Z` suffix. Fails once all 52 are in use.
pub fn allocate_scan_name(mountpoints: &[impl AsRef<Path>], scanname: &str) -> Result<String> {
    let taken = taken_suffixes(mountpoints, scanname)?;
    if !taken.contains("") {
        return Ok(scanname.to_string());
    }
    for suffix in SUFFIXES.chars() {
        let candidate = suffix.to_string();
        if !taken.contains(&candidate) {
            return Ok(format!("{scanname}{suffix}"));
        }
    }
    Err(StorageError::ScanNameSuffixesExhausted(scanname.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::create_dir;

    #[test]
    fn bare_name_is_used_when_free() {
        let dir = tempfile::tempdir().unwrap();
        let name = allocate_scan_name(&[dir.path()], "exp1").unwrap();
        assert_eq!(name, "exp1");
    }

    #[test]
    fn first_free_suffix_is_allocated_when_bare_name_taken() {
        let dir = tempfile::tempdir().unwrap();
        create_dir(dir.path().join("exp1")).unwrap();
        create_dir(dir.path().join("exp1a")).unwrap();
        let name = allocate_scan_name(&[dir.path()], "exp1").unwrap();
        assert_eq!(name, "exp1b");
    }

    #[test]
    fn exhaustion_of_all_52_suffixes_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        create_dir(dir.path().join("exp1")).unwrap();
        for c in SUFFIXES.chars() {
            create_dir(dir.path().join(format!("exp1{c}"))).unwrap();
        }
        assert!(allocate_scan_name(&[dir.path()], "exp1").is_err());
    }
}
