use anyhow::Result;
use fanout_shell::{Interpreter, ShellConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config: ShellConfig = argh::from_env();
    let mut shell = Interpreter::new(&config)?;
    shell.repl()?;
    Ok(())
}
