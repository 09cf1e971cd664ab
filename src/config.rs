use argh::FromArgs;
use std::num::NonZeroUsize;
use std::thread;

/// Interactive shell with concurrent recursive `ls`, `cp` and `rm`.
///
/// Log verbosity is controlled with `RUST_LOG` (default: `warn`).
#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    #[argh(option, short = 'j', default = "default_jobs()")]
    /// number of worker threads used by recursive traversals (default: logical CPUs)
    pub jobs: usize,

    #[argh(option, default = "String::from(\"> \")")]
    /// text printed before each command line
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            prompt: String::from("> "),
        }
    }
}

fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ShellConfig::from_args(&["fanout_shell"], &[]).unwrap();
        assert_eq!(config, ShellConfig::default());
        assert!(config.jobs >= 1);
    }

    #[test]
    fn test_config_overrides() {
        let config =
            ShellConfig::from_args(&["fanout_shell"], &["-j", "8", "--prompt", "$ "]).unwrap();
        assert_eq!(config.jobs, 8);
        assert_eq!(config.prompt, "$ ");
    }

    #[test]
    fn test_config_rejects_non_numeric_jobs() {
        assert!(ShellConfig::from_args(&["fanout_shell"], &["--jobs", "many"]).is_err());
    }
}
