//! Skillforge command-line entry point.
//!
//! Binary name: `skillforge`
//!
//! Parses CLI arguments, sets up tracing, loads configuration and saved
//! preferences, then runs a single command or the interactive menu.

mod cli;
mod prompter;
mod state;
mod ui;

use clap::Parser;
use clap_complete::generate;

use skillforge_infra::config::load_dotenv;
use skillforge_observe::tracing_setup::{LogLevel, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or logging
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "skillforge", &mut std::io::stdout());
        return Ok(());
    }

    if let Err(e) = init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet), cli.trace_spans) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }
    load_dotenv();

    let debug = cli.debug;
    let result = run(cli).await;
    shutdown_tracing();

    match result {
        Ok(()) => Ok(()),
        Err(e) if ui::is_interrupted(&e) => {
            println!();
            ui::info("Cancelled.");
            Ok(())
        }
        Err(e) if debug => {
            ui::print_rate_limit_notice(&e);
            Err(e)
        }
        Err(e) => {
            ui::print_error(&e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut state = AppState::init(cli.config).await?;

    match cli.command {
        None => cli::menu::run(&mut state).await,

        Some(Commands::Generate {
            intent,
            output,
            hooks,
            no_hooks,
        }) => {
            let args = cli::generate::GenerateArgs {
                intent,
                output,
                hooks: cli::hooks_flag(hooks, no_hooks),
            };
            cli::generate::run(&mut state, args).await
        }

        Some(Commands::Validate { file }) => cli::validate::run(&state, &file).await,

        Some(Commands::Browse { dir }) => cli::browse::run(&state, dir).await,

        Some(Commands::Projects) => cli::projects::run(&mut state).await,

        Some(Commands::Llm) => cli::llm::run(&mut state).await,

        Some(Commands::Completions { .. }) => unreachable!("handled above"),
    }
}
