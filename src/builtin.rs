use crate::action::{CopyAction, DeleteAction, PrintAction, copy_file};
use crate::command::{CommandFactory, CommandIo, CommandKind, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::ordering::OrderingPolicy;
use crate::traversal::{AggregatedOutcome, TraversalRequest};
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// The table key this command is registered under.
    const KIND: CommandKind;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        io: &mut CommandIo<'_>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let result = <T as BuiltinCommand>::execute(*self, io, env);
        io.stdout.flush()?;
        match result {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(io.stderr, "{}: {:#}", T::KIND, e)?;
                Ok(1)
            }
        }
    }
}

/// What argh hands back for `--help` and for malformed flags.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        io: &mut CommandIo<'_>,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.is_error {
            writeln!(io.stderr, "{}", self.output.trim_end())?;
            Ok(1)
        } else {
            writeln!(io.stdout, "{}", self.output.trim_end())?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn kind(&self) -> CommandKind {
        T::KIND
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        match T::from_args(&[T::KIND.name()], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

/// Prints every error collected by a traversal and turns the outcome into
/// an exit code.
fn report(
    kind: CommandKind,
    outcome: AggregatedOutcome,
    io: &mut CommandIo<'_>,
) -> Result<ExitCode> {
    let errors = outcome.into_errors();
    let code = if errors.is_empty() { 0 } else { 1 };
    for err in errors {
        writeln!(io.stderr, "{kind}: {:#}", anyhow::Error::from(err))?;
    }
    Ok(code)
}

/// Asks `question` on stdout and reads one answer line. Anything starting
/// with `y` or `Y` confirms; end of input declines.
fn confirm(io: &mut CommandIo<'_>, question: &str) -> Result<bool> {
    write!(io.stdout, "{question}")?;
    io.stdout.flush()?;
    let mut answer = String::new();
    io.stdin.read_line(&mut answer)?;
    Ok(answer.trim_start().starts_with(['y', 'Y']))
}

/// Removes a single file, symlink, or empty directory.
fn remove_path(path: &Path) -> Result<(), ShellError> {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(path),
        Ok(_) => fs::remove_file(path),
        Err(err) => Err(err),
    };
    removed.map_err(|source| ShellError::Delete {
        path: path.to_path_buf(),
        source,
    })
}

/// Canonical form of `path` when only a leading part of it exists yet: the
/// longest existing ancestor is resolved and the missing components are
/// joined back on.
fn canonicalize_existing_prefix(path: &Path) -> std::io::Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        match fs::canonicalize(current) {
            Ok(base) => {
                return Ok(missing.iter().rev().fold(base, |acc, name| acc.join(name)));
            }
            Err(err) => {
                let (Some(parent), Some(name)) = (current.parent(), current.file_name()) else {
                    return Err(err);
                };
                missing.push(name);
                current = parent;
            }
        }
    }
}

#[derive(FromArgs)]
/// List directory contents.
pub struct Ls {
    #[argh(switch, short = 'r')]
    /// list in reverse order
    pub reverse: bool,

    #[argh(switch, short = 's')]
    /// print the size of each entry
    pub size: bool,

    #[argh(switch, short = 'S')]
    /// sort by size, largest first
    pub sort_size: bool,

    #[argh(switch, short = 'R')]
    /// list subdirectories recursively
    pub recursive: bool,

    #[argh(positional)]
    /// directory to list; defaults to the current directory
    pub directory: Option<String>,
}

impl BuiltinCommand for Ls {
    const KIND: CommandKind = CommandKind::Ls;

    fn execute(self, io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let root = env.resolve(self.directory.as_deref().unwrap_or("."));
        let request = TraversalRequest::new(
            &root,
            OrderingPolicy::new(self.reverse, self.sort_size),
            self.recursive,
        );
        let print = PrintAction::new(&root, self.size, self.recursive);
        let outcome = env.engine.traverse(&request, &print);
        print.finish(io.stdout)?;
        report(Self::KIND, outcome, io)
    }
}

#[derive(FromArgs)]
/// Move or rename files.
pub struct Mv {
    #[argh(switch, short = 'f')]
    /// if the move fails, remove the destination and try once more
    pub force: bool,

    #[argh(switch, short = 'i')]
    /// prompt before overwriting an existing destination
    pub interactive: bool,

    #[argh(positional)]
    /// source followed by destination
    pub operands: Vec<String>,
}

impl BuiltinCommand for Mv {
    const KIND: CommandKind = CommandKind::Mv;

    fn execute(self, io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let [source, destination, ..] = self.operands.as_slice() else {
            return Err(ShellError::MissingArgument {
                what: "source or destination file",
            }
            .into());
        };
        let from = env.resolve(source);
        let to = env.resolve(destination);

        if self.interactive
            && fs::symlink_metadata(&to).is_ok()
            && !confirm(io, &format!("mv: overwrite '{destination}'? (y/n): "))?
        {
            return Ok(0);
        }

        let moved = match fs::rename(&from, &to) {
            Err(first) if self.force => {
                debug!(error = %first, to = %to.display(), "rename failed, removing destination");
                if let Err(err) = remove_path(&to) {
                    debug!(error = %err, "could not clear destination");
                }
                fs::rename(&from, &to)
            }
            other => other,
        };
        moved.map_err(|source| ShellError::Move { from, to, source })?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove files or directories.
pub struct Rm {
    #[argh(switch, short = 'i')]
    /// prompt before removal
    pub interactive: bool,

    #[argh(switch)]
    /// remove directories and their contents recursively
    pub recursive: bool,

    #[argh(positional)]
    /// file or directory to remove
    pub operands: Vec<String>,
}

impl BuiltinCommand for Rm {
    const KIND: CommandKind = CommandKind::Rm;

    fn execute(self, io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let target = self.operands.first().ok_or(ShellError::MissingArgument {
            what: "file operand",
        })?;
        let path = env.resolve(target);

        if self.interactive && !confirm(io, &format!("rm: remove '{target}'? (y/n): "))? {
            return Ok(0);
        }

        let meta = fs::symlink_metadata(&path).ok();
        if !self.recursive || meta.as_ref().is_some_and(|meta| !meta.is_dir()) {
            remove_path(&path)?;
            return Ok(0);
        }

        info!(root = %path.display(), "recursive remove");
        let request = TraversalRequest::new(&path, OrderingPolicy::default(), true);
        let mut outcome = env.engine.traverse(&request, &DeleteAction);
        if !outcome.enumeration_failed_at(&path) {
            if let Err(source) = fs::remove_dir(&path) {
                outcome.record(ShellError::Delete { path, source });
            }
        }
        report(Self::KIND, outcome, io)
    }
}

#[derive(FromArgs)]
/// Copy files.
pub struct Cp {
    #[argh(switch, short = 'r')]
    /// copy directories recursively
    pub recursive: bool,

    #[argh(positional)]
    /// source followed by destination
    pub operands: Vec<String>,
}

impl BuiltinCommand for Cp {
    const KIND: CommandKind = CommandKind::Cp;

    fn execute(self, io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let [source, destination, ..] = self.operands.as_slice() else {
            return Err(ShellError::MissingArgument {
                what: "source or destination file",
            }
            .into());
        };
        let from = env.resolve(source);
        let to = env.resolve(destination);

        let meta = fs::metadata(&from).map_err(|source| ShellError::Copy {
            path: from.clone(),
            source,
        })?;

        let canonical_from = fs::canonicalize(&from)
            .with_context(|| format!("can't canonicalize {}", from.display()))?;

        if !meta.is_dir() {
            let target = match from.file_name() {
                Some(name) if to.is_dir() => to.join(name),
                _ => to,
            };
            // opening the target for writing would truncate the source
            if fs::canonicalize(&target).is_ok_and(|target| target == canonical_from) {
                return Err(ShellError::SameFile {
                    source_file: from,
                    destination: target,
                }
                .into());
            }
            copy_file(&from, &target).map_err(|source| ShellError::Copy { path: from, source })?;
            return Ok(0);
        }

        if self.recursive {
            let canonical_to = canonicalize_existing_prefix(&to)
                .with_context(|| format!("can't canonicalize {}", to.display()))?;
            if canonical_to.starts_with(&canonical_from) {
                return Err(ShellError::CopyIntoSelf {
                    source_dir: from,
                    destination: to,
                }
                .into());
            }
        }

        // the destination exists even when the source has nothing to copy
        fs::create_dir_all(&to).map_err(|source| ShellError::Copy {
            path: to.clone(),
            source,
        })?;

        info!(
            from = %from.display(),
            to = %to.display(),
            recursive = self.recursive,
            "directory copy"
        );
        let request = TraversalRequest::new(&from, OrderingPolicy::default(), self.recursive);
        let outcome = env.engine.traverse(&request, &CopyAction::new(&from, &to));
        report(Self::KIND, outcome, io)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    const KIND: CommandKind = CommandKind::Cd;

    fn execute(self, _io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let target = self
            .target
            .filter(|t| !t.is_empty())
            .ok_or(ShellError::MissingArgument { what: "argument" })?;
        let new_dir = env.resolve(target);

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    const KIND: CommandKind = CommandKind::Exit;

    fn execute(self, _io: &mut CommandIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// One factory per [`CommandKind`].
pub(crate) fn default_factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Ls>::default()),
        Box::new(Factory::<Mv>::default()),
        Box::new(Factory::<Rm>::default()),
        Box::new(Factory::<Cp>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}
