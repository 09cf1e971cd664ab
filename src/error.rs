//! Error taxonomy shared by the traversal engine and the builtins.
//!
//! Traversal errors are never thrown across a whole tree: they are collected
//! per entry into an [`AggregatedOutcome`](crate::traversal::AggregatedOutcome)
//! and reported once the traversal has joined. Single-shot handlers (`mv`,
//! non-recursive `rm`, `cd`) return the first error through `anyhow`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// A directory could not be listed.
    #[error("cannot access '{}'", .path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a source entry or writing its mirrored destination failed.
    #[error("cannot copy '{}'", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory was handed to a non-recursive copy.
    #[error("-r not specified; omitting directory '{}'", .path.display())]
    OmittedDirectory { path: PathBuf },

    /// The destination of a recursive copy lies inside its own source.
    #[error("cannot copy a directory, '{}', into itself, '{}'", .source_dir.display(), .destination.display())]
    CopyIntoSelf {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    /// Source and destination of a file copy resolve to the same file.
    #[error("'{}' and '{}' are the same file", .source_file.display(), .destination.display())]
    SameFile {
        source_file: PathBuf,
        destination: PathBuf,
    },

    #[error("cannot remove '{}'", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot move '{}' to '{}'", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The command line did not carry the operands the command needs.
    #[error("missing {what}")]
    MissingArgument { what: &'static str },

    #[error("Command not recognized: {0}")]
    UnknownCommand(String),
}

impl ShellError {
    /// Path the error is about, when it concerns a single filesystem entry.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ShellError::Enumeration { path, .. }
            | ShellError::Copy { path, .. }
            | ShellError::OmittedDirectory { path }
            | ShellError::Delete { path, .. } => Some(path),
            ShellError::Move { from, .. } => Some(from),
            ShellError::CopyIntoSelf { destination, .. }
            | ShellError::SameFile { destination, .. } => Some(destination),
            ShellError::MissingArgument { .. } | ShellError::UnknownCommand(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_messages_name_the_failing_path() {
        let err = ShellError::Enumeration {
            path: PathBuf::from("/no/such/dir"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "cannot access '/no/such/dir'");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.path(), Some(Path::new("/no/such/dir")));
    }

    #[test]
    fn test_missing_argument_has_no_path() {
        let err = ShellError::MissingArgument {
            what: "file operand",
        };
        assert_eq!(err.to_string(), "missing file operand");
        assert!(err.path().is_none());
    }
}
