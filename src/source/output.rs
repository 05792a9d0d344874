//! Output file handling
//!
//! Outputs are written to a temporary file beside the destination and renamed
//! into place, so a failed run never leaves a partial file behind.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const STAGING_PREFIX: &str = ".pdf-tools-";

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Create a temporary file in the destination's directory, creating the
/// directory if it doesn't exist.
pub fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let parent = parent_dir(path);
    if !parent.exists() {
        std::fs::create_dir_all(parent)?;
    }

    // Keep the destination's extension; some tools pick a format from it
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".part".to_string());
    let file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(&suffix)
        .tempfile_in(parent)?;
    Ok(file)
}

/// Move a staged file onto its destination, replacing any existing file.
pub fn commit(staged: NamedTempFile, path: &Path) -> Result<PathBuf> {
    staged.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(path.to_path_buf())
}

/// Write `data` to a staging file for `path` without committing it.
pub fn stage(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let mut staged = staging_file(path)?;
    staged.write_all(data)?;
    staged.flush()?;
    Ok(staged)
}

/// Write output data to a file path atomically.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<PathBuf> {
    let staged = stage(path, data)?;
    commit(staged, path)
}

/// Whether two paths name the same file (the second may not exist yet)
pub fn same_file(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| -> Option<PathBuf> {
        if let Ok(c) = std::fs::canonicalize(p) {
            return Some(c);
        }
        let parent = std::fs::canonicalize(parent_dir(p)).ok()?;
        Some(parent.join(p.file_name()?))
    };

    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out/file.txt");
        write_atomic(&target, b"hello").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");

        // Overwrites in place and leaves no staging files behind
        write_atomic(&target, b"again").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"again");
        let leftovers: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_dropped_staging_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        let staged = staging_file(&target).unwrap();
        let staged_path = staged.path().to_path_buf();
        assert!(staged_path.exists());
        drop(staged);
        assert!(!staged_path.exists());
        assert!(!target.exists());
    }

    #[test]
    fn test_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        std::fs::write(&a, b"x").unwrap();
        let a_again = dir.path().join(".").join("a.pdf");
        assert!(same_file(&a, &a_again));
        assert!(!same_file(&a, &dir.path().join("b.pdf")));
    }
}
