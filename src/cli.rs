use clap::Parser;
use std::path::PathBuf;

/// Produce, encrypt and queue for email the pending customer letters.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "secure-letters", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file applied over the built-in defaults.
    #[arg(long, visible_alias = "cfg", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only report warnings and errors.
    #[arg(short, long, conflicts_with = "debug")]
    pub silent: bool,

    /// Echo every SQL statement and tool invocation.
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else if self.silent {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        }
    }
}
