pub mod demo;
pub mod run;
pub mod stages;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::chain::ChainMode;
use crate::config::Preset;

#[derive(Parser)]
#[command(name = "scrubline", version, about = "Ordered injection sanitization pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sanitize a string (argument or stdin) and print the result.
    Run {
        /// Input to sanitize. Reads stdin when omitted.
        input: Option<String>,

        /// Traversal mode: first-match (default) or all.
        #[arg(long)]
        mode: Option<ChainMode>,

        /// Chain preset: default, no-sql, no-xss, or no-minor.
        #[arg(long, conflicts_with = "config")]
        preset: Option<Preset>,

        /// YAML chain config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit a JSON report (output + applied stages) instead of the bare
        /// string.
        #[arg(long)]
        json: bool,
    },

    /// Sanitize a built-in example string and show what fired.
    Demo,

    /// List the stages of the default chain in traversal order.
    Stages,
}

impl Cli {
    pub fn dispatch(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run {
                input,
                mode,
                preset,
                config,
                json,
            } => run::run(input, mode, preset, config.as_deref(), json),
            Command::Demo => demo::run(),
            Command::Stages => stages::run(),
        }
    }
}
