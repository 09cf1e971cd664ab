//! Concurrent, recursive directory traversal.
//!
//! Every level of the tree is enumerated, ordered, and then fanned out: one
//! task per entry, spawned into a [`rayon::scope`]. The scope is the join
//! barrier of the level, so a level (and therefore a whole `traverse` call)
//! returns only after every task it spawned, including nested levels, has
//! finished. Tasks run on a bounded [`rayon::ThreadPool`]; a task blocked on
//! a nested scope keeps stealing work, so deep trees do not starve the pool.
//!
//! ```text
//! traverse(root)
//! └── level(root): enumerate → order → scope {
//!       ├── task(a.txt)  → action.visit
//!       ├── task(sub/)   → action.enter_dir
//!       │                  level(sub): enumerate → order → scope { ... }   (joined)
//!       │                  action.leave_dir
//!       └── task(b.txt)  → action.visit
//!     }                                                                   (joined)
//! ```
//!
//! Failures never cancel siblings. They are collected per task and merged
//! upward in task order into an [`AggregatedOutcome`].

use crate::enumerate::{DirectoryEntry, enumerate};
use crate::error::ShellError;
use crate::ordering::OrderingPolicy;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Ordinal path of a task from the traversal root.
///
/// `[2, 0]` is the first entry (after ordering) of the third entry of the
/// root. Lexicographic order over positions is pre-order over the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(Vec<usize>);

impl Position {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = Vec::with_capacity(self.0.len() + 1);
        path.extend_from_slice(&self.0);
        path.push(index);
        Self(path)
    }

    /// Number of levels below the traversal root; top-level entries are 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Unit of concurrent work: one entry and where it sits in the ordered tree.
#[derive(Debug, Clone)]
pub struct TraversalTask {
    pub entry: DirectoryEntry,
    pub position: Position,
}

/// What to do with each entry the engine reaches.
///
/// `visit` is called for leaves, and for directories when the traversal is
/// not recursive. With recursion, a directory gets `enter_dir`, then its
/// whole subtree (joined), then `leave_dir` with the subtree's outcome.
pub trait EntryAction: Sync {
    fn visit(&self, task: &TraversalTask) -> Result<(), ShellError>;

    /// Runs before the subtree is spawned. An error skips the subtree.
    fn enter_dir(&self, _task: &TraversalTask) -> Result<(), ShellError> {
        Ok(())
    }

    /// Runs once every descendant has finished, successfully or not.
    fn leave_dir(
        &self,
        _task: &TraversalTask,
        _subtree: &AggregatedOutcome,
    ) -> Result<(), ShellError> {
        Ok(())
    }
}

/// What a command hands to the engine.
#[derive(Debug, Clone)]
pub struct TraversalRequest {
    pub root: PathBuf,
    pub ordering: OrderingPolicy,
    pub recursive: bool,
}

impl TraversalRequest {
    pub fn new(root: impl Into<PathBuf>, ordering: OrderingPolicy, recursive: bool) -> Self {
        Self {
            root: root.into(),
            ordering,
            recursive,
        }
    }
}

/// Errors and counts gathered by one level and everything below it.
#[derive(Debug, Default)]
pub struct AggregatedOutcome {
    errors: Vec<ShellError>,
    visited: usize,
}

impl AggregatedOutcome {
    fn failed(err: ShellError) -> Self {
        Self {
            errors: vec![err],
            visited: 0,
        }
    }

    pub fn record(&mut self, err: ShellError) {
        self.errors.push(err);
    }

    pub fn merge(&mut self, other: AggregatedOutcome) {
        self.errors.extend(other.errors);
        self.visited += other.visited;
    }

    pub fn errors(&self) -> &[ShellError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ShellError> {
        self.errors
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of entries a task was spawned for.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Whether listing `dir` itself failed during the traversal.
    pub fn enumeration_failed_at(&self, dir: &Path) -> bool {
        self.errors
            .iter()
            .any(|err| matches!(err, ShellError::Enumeration { path, .. } if path == dir))
    }
}

/// Fan-out engine backed by a bounded worker pool.
#[derive(Debug)]
pub struct TraversalEngine {
    pool: ThreadPool,
}

impl TraversalEngine {
    /// Builds an engine with `jobs` workers; `0` lets rayon pick.
    pub fn new(jobs: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|index| format!("traverse-{index}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn jobs(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Applies `action` to the children of `request.root` (and, when
    /// recursive, to the whole tree below it). Blocks until all of it is done.
    pub fn traverse<A: EntryAction>(
        &self,
        request: &TraversalRequest,
        action: &A,
    ) -> AggregatedOutcome {
        let outcome = self
            .pool
            .install(|| walk_level(&request.root, &Position::root(), request, action));
        debug!(
            root = %request.root.display(),
            visited = outcome.visited(),
            errors = outcome.errors().len(),
            "traversal joined"
        );
        outcome
    }
}

fn walk_level<A: EntryAction>(
    dir: &Path,
    position: &Position,
    request: &TraversalRequest,
    action: &A,
) -> AggregatedOutcome {
    let entries = match enumerate(dir) {
        Ok(entries) => request.ordering.apply(entries),
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "treating unreadable directory as empty");
            return AggregatedOutcome::failed(err);
        }
    };
    debug!(dir = %dir.display(), tasks = entries.len(), "fanning out");

    let finished = Mutex::new(Vec::with_capacity(entries.len()));
    rayon::scope(|scope| {
        for (index, entry) in entries.into_iter().enumerate() {
            let finished = &finished;
            let task = TraversalTask {
                entry,
                position: position.child(index),
            };
            scope.spawn(move |_| {
                let outcome = run_task(&task, request, action);
                finished
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((index, outcome));
            });
        }
    });

    let mut finished = finished.into_inner().unwrap_or_else(PoisonError::into_inner);
    finished.sort_by_key(|(index, _)| *index);
    finished
        .into_iter()
        .fold(AggregatedOutcome::default(), |mut outcome, (_, child)| {
            outcome.merge(child);
            outcome
        })
}

fn run_task<A: EntryAction>(
    task: &TraversalTask,
    request: &TraversalRequest,
    action: &A,
) -> AggregatedOutcome {
    let mut outcome = AggregatedOutcome {
        errors: Vec::new(),
        visited: 1,
    };

    if request.recursive && task.entry.is_dir() {
        if let Err(err) = action.enter_dir(task) {
            outcome.record(err);
            return outcome;
        }
        let subtree = walk_level(&task.entry.path(), &task.position, request, action);
        let left = action.leave_dir(task, &subtree);
        outcome.merge(subtree);
        if let Err(err) = left {
            outcome.record(err);
        }
    } else if let Err(err) = action.visit(task) {
        outcome.record(err);
    }
    outcome
}
