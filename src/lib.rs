//! A tiny interactive shell for file management with a concurrent core.
//!
//! Five commands are available (`ls`, `mv`, `rm`, `cp`, `cd`) plus `exit`.
//! The recursive variants, `ls -R`, `cp -r` and `rm --recursive`, run on a
//! shared [`TraversalEngine`]: every directory level fans out one task per
//! entry onto a bounded worker pool and joins all of them, nested levels
//! included, before the level is considered done. Failures are collected per
//! entry instead of aborting the walk.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! engine and its [`EntryAction`](traversal::EntryAction) seam so other
//! per-entry behaviors can be plugged in.

pub mod action;
mod builtin;
pub mod command;
mod config;
pub mod enumerate;
pub mod env;
pub mod error;
mod interpreter;
mod lexer;
pub mod ordering;
pub mod traversal;

pub use config::ShellConfig;
pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use lexer::{LexingError, split_into_words};
pub use traversal::TraversalEngine;
