//! Listing the immediate children of a directory.

use crate::error::ShellError;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A named child of a directory, as seen at enumeration time.
///
/// The size is absent until someone asks for it: either the ordering policy
/// (sort by size) or the printer (`ls -s`). See [`DirectoryEntry::probed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    name: OsString,
    parent: PathBuf,
    is_dir: bool,
    size: Option<u64>,
}

impl DirectoryEntry {
    pub fn new(parent: impl Into<PathBuf>, name: impl Into<OsString>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            is_dir,
            size: None,
        }
    }

    /// Same entry with a known size.
    pub fn with_size(self, size: u64) -> Self {
        Self {
            size: Some(size),
            ..self
        }
    }

    /// Same entry with its size filled in from the filesystem if it was not
    /// known yet.
    pub fn probed(self) -> Self {
        match self.size {
            Some(_) => self,
            None => {
                let size = probe_size(&self.path());
                self.with_size(size)
            }
        }
    }

    pub fn name(&self) -> &OsString {
        &self.name
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Resolved path of the entry: its parent joined with its name.
    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }
}

/// Lists `dir` in host enumeration order. No sorting happens here.
///
/// `.` and `..` never show up. Entry types come from the directory listing
/// itself, without following symlinks, so a link to a directory is a leaf.
pub fn enumerate(dir: &Path) -> Result<Vec<DirectoryEntry>, ShellError> {
    let wrap = |source| ShellError::Enumeration {
        path: dir.to_path_buf(),
        source,
    };

    fs::read_dir(dir)
        .map_err(wrap)?
        .filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            let name = entry.file_name();
            if name == "." || name == ".." {
                return None;
            }
            Some(
                entry
                    .file_type()
                    .map(|file_type| DirectoryEntry::new(dir, name, file_type.is_dir())),
            )
        })
        .collect::<io::Result<Vec<_>>>()
        .map_err(wrap)
}

/// `stat`-style size of `path`. An entry that vanished (or cannot be
/// stat'ed) counts as zero bytes rather than failing the caller.
pub fn probe_size(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "size probe failed, assuming 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_enumerate_lists_children_without_pseudo_entries() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), b"0123456789").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let entries = enumerate(tmp.path()).unwrap();
        let names: HashSet<_> = entries
            .iter()
            .map(|e| e.name().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, HashSet::from(["a.txt".to_string(), "sub".to_string()]));
        for entry in &entries {
            assert_eq!(entry.parent(), tmp.path());
            assert_eq!(entry.is_dir(), entry.name() == "sub");
            assert_eq!(entry.size(), None);
        }
    }

    #[test]
    fn test_enumerate_missing_dir_is_enumeration_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");

        match enumerate(&missing) {
            Err(ShellError::Enumeration { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_enumerate_file_is_enumeration_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            enumerate(&file),
            Err(ShellError::Enumeration { .. })
        ));
    }

    #[test]
    fn test_probe_fills_size_once() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), vec![b'x'; 30]).unwrap();

        let entry = DirectoryEntry::new(tmp.path(), "b.txt", false).probed();
        assert_eq!(entry.size(), Some(30));

        // already known sizes are not re-probed
        let entry = DirectoryEntry::new(tmp.path(), "b.txt", false)
            .with_size(7)
            .probed();
        assert_eq!(entry.size(), Some(7));
    }

    #[test]
    fn test_probe_of_vanished_entry_is_zero() {
        let tmp = TempDir::new().unwrap();
        let entry = DirectoryEntry::new(tmp.path(), "gone", false).probed();
        assert_eq!(entry.size(), Some(0));
    }
}
