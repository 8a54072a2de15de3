//! CLI command definitions for the `skillforge` binary.
//!
//! Running without a subcommand opens the interactive menu; every menu
//! entry is also reachable directly as a subcommand.

pub mod browse;
pub mod generate;
pub mod llm;
pub mod menu;
pub mod projects;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use skillforge_types::skill::OutputLocation;

/// Generate agent skills through a guided conversation with an LLM.
#[derive(Parser)]
#[command(name = "skillforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to ./skillforge.toml).
    #[arg(long, global = true, value_name = "PATH", env = "SKILLFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Return the full error chain on failure.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub trace_spans: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new skill.
    #[command(alias = "new")]
    Generate {
        /// What the skill should do (prompted for when omitted).
        intent: Option<String>,

        /// Where to save: personal, project, or a directory path.
        #[arg(short, long, value_name = "LOCATION", value_parser = parse_location)]
        output: Option<OutputLocation>,

        /// Ask about and include hooks.
        #[arg(long, conflicts_with = "no_hooks")]
        hooks: bool,

        /// Leave hooks out.
        #[arg(long)]
        no_hooks: bool,
    },

    /// Validate an existing SKILL.md.
    Validate {
        /// Path to the SKILL.md file.
        file: PathBuf,
    },

    /// Browse installed skills and import them into this project.
    #[command(alias = "ls")]
    Browse {
        /// Skills directory to browse (defaults to the personal skills dir).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Import skills into projects and manage project roots.
    Projects,

    /// Choose the active LLM provider.
    Llm,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn parse_location(s: &str) -> Result<OutputLocation, String> {
    s.parse()
}

/// `--hooks` / `--no-hooks` as a tri-state; `None` means ask.
pub fn hooks_flag(hooks: bool, no_hooks: bool) -> Option<bool> {
    match (hooks, no_hooks) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
