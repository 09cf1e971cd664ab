use crate::config::ShellConfig;
use crate::traversal::TraversalEngine;
use anyhow::{Context, Result};
use std::env as stdenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Mutable, per-session state shared by the builtins.
///
/// The environment contains:
/// - `current_dir`: the directory relative operands resolve against.
/// - `should_exit`: set by `exit`; the REPL loop stops when it sees it.
/// - `engine`: the traversal engine used by `ls -R`, `cp -r` and `rm --recursive`.
///
/// Note: fields are public for simplicity, matching how builtins poke at them.
#[derive(Debug, Clone)]
pub struct Environment {
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that an interactive loop should exit.
    pub should_exit: bool,
    /// Worker pool shared by every recursive command of the session.
    pub engine: Arc<TraversalEngine>,
}

impl Environment {
    /// Capture the process working directory and build the traversal engine
    /// sized from `config`.
    pub fn new(config: &ShellConfig) -> Result<Self> {
        let engine = TraversalEngine::new(config.jobs)
            .with_context(|| format!("can't start {} traversal workers", config.jobs))?;
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self::with_engine(current_dir, Arc::new(engine)))
    }

    pub fn with_engine(current_dir: PathBuf, engine: Arc<TraversalEngine>) -> Self {
        Self {
            current_dir,
            should_exit: false,
            engine,
        }
    }

    /// Absolute operands pass through; relative ones are joined onto
    /// `current_dir`.
    pub fn resolve(&self, operand: impl AsRef<Path>) -> PathBuf {
        let operand = operand.as_ref();
        if operand.is_absolute() {
            operand.to_path_buf()
        } else {
            self.current_dir.join(operand)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let engine = Arc::new(TraversalEngine::new(1).unwrap());
        let env = Environment::with_engine(PathBuf::from("/work"), engine);

        assert_eq!(env.resolve("a/b"), PathBuf::from("/work/a/b"));
        assert_eq!(env.resolve("/etc"), PathBuf::from("/etc"));
        assert!(!env.should_exit);
    }

    #[test]
    fn test_env_sizes_engine_from_config() {
        let config = ShellConfig {
            jobs: 3,
            ..ShellConfig::default()
        };
        let env = Environment::new(&config).unwrap();
        assert_eq!(env.engine.jobs(), 3);
        assert!(env.current_dir.is_absolute() || env.current_dir == Path::new("."));
    }
}
