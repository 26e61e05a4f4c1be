//! `cover` -- vehicle coverage entitlement CLI.
//!
//! Parses CLI arguments with clap, resolves the runtime context and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();

    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cover=debug,cover_rules=debug,cover_config=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli.command, &cli.global) {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(command: Option<Commands>, global: &cli::GlobalArgs) -> Result<()> {
    // Completions need no project context.
    if let Some(Commands::Completion(args)) = &command {
        return commands::completion::run(args);
    }

    let ctx = RuntimeContext::from_global_args(global)?;
    tracing::debug!(cover_dir = ?ctx.cover_dir, rules = ?ctx.rules, "context resolved");

    match command {
        Some(Commands::Evaluate(args)) => commands::evaluate::run(&ctx, &args),
        Some(Commands::Schema) => commands::schema_cmd::run(&ctx),
        Some(Commands::Check(args)) => commands::check::run(&ctx, &args),
        Some(Commands::Config(args)) => commands::config_cmd::run(&ctx, &args),
        Some(Commands::Version) => commands::version::run(&ctx),
        Some(Commands::Completion(args)) => commands::completion::run(&args),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
