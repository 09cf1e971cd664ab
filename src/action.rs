//! The three per-entry behaviors plugged into the traversal engine.

use crate::enumerate::probe_size;
use crate::error::ShellError;
use crate::traversal::{AggregatedOutcome, EntryAction, Position, TraversalTask};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Single ordering gate shared by concurrently running print tasks.
///
/// Tasks submit finished lines keyed by their position; once the traversal
/// has joined, [`OutputGate::flush_into`] writes them in pre-order. Output is
/// therefore identical from run to run no matter how tasks interleave.
#[derive(Debug, Default)]
pub struct OutputGate {
    lines: Mutex<BTreeMap<Position, String>>,
}

impl OutputGate {
    pub fn submit(&self, position: &Position, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(position.clone(), line);
    }

    pub fn flush_into(self, out: &mut dyn Write) -> io::Result<()> {
        let lines = self.lines.into_inner().unwrap_or_else(PoisonError::into_inner);
        for line in lines.into_values() {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

/// `ls`: formats each entry as `[size<TAB>]path`, where path is relative to
/// the listed root. In recursive listings directories end with `/`.
#[derive(Debug)]
pub struct PrintAction {
    root: PathBuf,
    show_size: bool,
    mark_dirs: bool,
    gate: OutputGate,
}

impl PrintAction {
    pub fn new(root: impl Into<PathBuf>, show_size: bool, mark_dirs: bool) -> Self {
        Self {
            root: root.into(),
            show_size,
            mark_dirs,
            gate: OutputGate::default(),
        }
    }

    /// Writes everything printed so far, in tree order.
    pub fn finish(self, out: &mut dyn Write) -> io::Result<()> {
        self.gate.flush_into(out)
    }

    fn format(&self, task: &TraversalTask, is_dir: bool) -> String {
        let path = task.entry.path();
        let relative = path.strip_prefix(&self.root).unwrap_or(&path);
        let mut line = String::new();
        if self.show_size {
            let size = task.entry.size().unwrap_or_else(|| probe_size(&path));
            line.push_str(&format!("{size}\t"));
        }
        line.push_str(&relative.to_string_lossy());
        if is_dir && self.mark_dirs {
            line.push('/');
        }
        line
    }
}

impl EntryAction for PrintAction {
    fn visit(&self, task: &TraversalTask) -> Result<(), ShellError> {
        self.gate.submit(&task.position, self.format(task, task.entry.is_dir()));
        Ok(())
    }

    fn enter_dir(&self, task: &TraversalTask) -> Result<(), ShellError> {
        self.gate.submit(&task.position, self.format(task, true));
        Ok(())
    }
}

/// `cp`: mirrors every entry under `source_root` to the same relative path
/// under `destination_root`.
#[derive(Debug, Clone)]
pub struct CopyAction {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl CopyAction {
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    /// Destination root joined with `source`'s path relative to the source root.
    pub fn mirrored(&self, source: &Path) -> PathBuf {
        match source.strip_prefix(&self.source_root) {
            Ok(relative) => self.destination_root.join(relative),
            Err(_) => self
                .destination_root
                .join(source.file_name().unwrap_or_default()),
        }
    }
}

impl EntryAction for CopyAction {
    fn visit(&self, task: &TraversalTask) -> Result<(), ShellError> {
        let source = task.entry.path();
        if task.entry.is_dir() {
            return Err(ShellError::OmittedDirectory { path: source });
        }
        let destination = self.mirrored(&source);
        copy_file(&source, &destination).map_err(|source_err| ShellError::Copy {
            path: source,
            source: source_err,
        })?;
        Ok(())
    }

    fn enter_dir(&self, task: &TraversalTask) -> Result<(), ShellError> {
        let destination = self.mirrored(&task.entry.path());
        fs::create_dir_all(&destination).map_err(|source| ShellError::Copy {
            path: destination,
            source,
        })
    }
}

/// Streams the bytes of `source` into a freshly truncated `destination`.
/// Permissions and timestamps are not carried over.
pub fn copy_file(source: &Path, destination: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut writer = File::create(destination)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}

/// `rm --recursive`: files go as soon as their task runs, directories only
/// after their whole subtree has joined, so removal is bottom-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteAction;

impl EntryAction for DeleteAction {
    fn visit(&self, task: &TraversalTask) -> Result<(), ShellError> {
        let path = task.entry.path();
        let removed = if task.entry.is_dir() {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|source| ShellError::Delete { path, source })
    }

    fn leave_dir(
        &self,
        task: &TraversalTask,
        subtree: &AggregatedOutcome,
    ) -> Result<(), ShellError> {
        let path = task.entry.path();
        if !subtree.is_clean() {
            tracing::warn!(
                dir = %path.display(),
                failed_children = subtree.errors().len(),
                "removing directory with failed children"
            );
        }
        fs::remove_dir(&path).map_err(|source| ShellError::Delete { path, source })
    }
}
