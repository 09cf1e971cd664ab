use crate::builtin::default_factories;
use crate::command::{CommandFactory, CommandIo, CommandKind, ExitCode};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::HashMap;
use std::io;
use tracing::{debug, info};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate, see [`CommandKind`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal interactive shell for `ls`, `mv`, `rm`, `cp`, `cd` and `exit`.
///
/// The interpreter keeps an [`Environment`] and a dispatch table mapping each
/// [`CommandKind`] to the [`CommandFactory`] that builds it. The table is
/// filled once, when the interpreter is created.
///
/// Example
/// ```
/// use fanout_shell::{Interpreter, ShellConfig};
/// use fanout_shell::command::CommandIo;
///
/// let mut sh = Interpreter::new(&ShellConfig::default()).unwrap();
/// let (mut stdin, mut stdout, mut stderr) = (std::io::empty(), Vec::new(), Vec::new());
/// let mut io = CommandIo { stdin: &mut stdin, stdout: &mut stdout, stderr: &mut stderr };
/// let code = sh.execute_line("ls --help", &mut io).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: HashMap<CommandKind, Box<dyn CommandFactory>>,
    prompt: String,
}

impl Interpreter {
    /// Create an interpreter with every builtin registered.
    pub fn new(config: &ShellConfig) -> anyhow::Result<Self> {
        let env = Environment::new(config)?;
        info!(jobs = env.engine.jobs(), "shell ready");
        Ok(Self::with_commands(env, default_factories(), &config.prompt))
    }

    /// Create an interpreter over an existing environment and a custom set of
    /// factories. A later factory for the same kind replaces an earlier one.
    pub fn with_commands(
        env: Environment,
        factories: Vec<Box<dyn CommandFactory>>,
        prompt: &str,
    ) -> Self {
        let commands = factories
            .into_iter()
            .map(|factory| (factory.kind(), factory))
            .collect();
        Self {
            env,
            commands,
            prompt: prompt.to_string(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Whether `exit` has been run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code, or an error if the name is unknown.
    /// Failures inside the command are printed by the command itself.
    pub fn run(
        &mut self,
        name: &str,
        args: &[&str],
        io: &mut CommandIo<'_>,
    ) -> anyhow::Result<ExitCode> {
        let kind: CommandKind = name.parse()?;
        let factory = self
            .commands
            .get(&kind)
            .ok_or_else(|| ShellError::UnknownCommand(name.to_string()))?;
        debug!(command = %kind, ?args, "dispatching");
        factory.create(args).execute(io, &mut self.env)
    }

    /// Tokenize `line` and run it. Command errors are written to `io.stderr`
    /// and turned into a non-zero exit code; only I/O failures on the
    /// streams themselves are returned as errors.
    pub fn execute_line(&mut self, line: &str, io: &mut CommandIo<'_>) -> io::Result<ExitCode> {
        let words = match lexer::split_into_words(line) {
            Ok(words) => words,
            Err(err) => {
                writeln!(io.stderr, "shell: {err}")?;
                return Ok(2);
            }
        };
        let Some((name, args)) = words.split_first() else {
            return Ok(0);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let code = match self.run(name, &args, io) {
            Ok(code) => code,
            Err(err) => {
                writeln!(io.stderr, "{err:#}")?;
                1
            }
        };
        io.stdout.flush()?;
        Ok(code)
    }

    /// Read-Eval-Print Loop on the terminal. Ends on `exit` or end of input;
    /// Ctrl-C only abandons the current line.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.env.should_exit {
            let readline = rl.readline(&self.prompt);
            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    let stdin = io::stdin();
                    let mut stdin = stdin.lock();
                    let (mut stdout, mut stderr) = (io::stdout(), io::stderr());
                    let mut io = CommandIo {
                        stdin: &mut stdin,
                        stdout: &mut stdout,
                        stderr: &mut stderr,
                    };
                    let code = self.execute_line(&line, &mut io)?;
                    debug!(code, "command finished");
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}
