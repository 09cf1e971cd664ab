use crate::env::Environment;
use crate::error::ShellError;
use anyhow::Result;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// The shell only distinguishes "succeeded" from "printed an error".
pub type ExitCode = i32;

/// The closed set of commands the shell knows about.
///
/// The interpreter resolves a command name to one of these once, then looks
/// the handler up in a table keyed by the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Ls,
    Mv,
    Rm,
    Cp,
    Cd,
    Exit,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Ls,
        CommandKind::Mv,
        CommandKind::Rm,
        CommandKind::Cp,
        CommandKind::Cd,
        CommandKind::Exit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Ls => "ls",
            CommandKind::Mv => "mv",
            CommandKind::Rm => "rm",
            CommandKind::Cp => "cp",
            CommandKind::Cd => "cd",
            CommandKind::Exit => "exit",
        }
    }
}

impl FromStr for CommandKind {
    type Err = ShellError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ShellError::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Streams a command runs against.
///
/// `stdin` is only read by confirmation prompts (`mv -i`, `rm -i`).
pub struct CommandIo<'a> {
    pub stdin: &'a mut dyn BufRead,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Object-safe trait for any command that can be executed by the shell.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(self: Box<Self>, io: &mut CommandIo<'_>, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Builds a ready-to-run command for one [`CommandKind`] from its arguments.
pub trait CommandFactory {
    /// The command this factory is registered under.
    fn kind(&self) -> CommandKind;

    /// Parse `args` (without the command name) into an executable command.
    ///
    /// Flag errors and `--help` are not failures here: they produce a command
    /// that prints the parser's message.
    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}
