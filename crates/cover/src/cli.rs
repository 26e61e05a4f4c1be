//! Clap CLI definitions for the `cover` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// cover -- vehicle coverage entitlement rules.
///
/// Evaluates which insurance coverages apply to a crown-owned, leased or
/// private vehicle from facts about how it was procured, paid for and where
/// it travels.
#[derive(Parser, Debug)]
#[command(
    name = "cover",
    about = "Vehicle coverage entitlement rules",
    long_about = "Evaluates which insurance coverages apply to a crown-owned, leased or private vehicle.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Rule table name or path (default: configured table, else built-in vehicle rules).
    #[arg(long, global = true)]
    pub rules: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate coverage for one or more vehicles.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Show facts, enumerations and derived variables of the rule table.
    Schema,

    /// Validate a rule table file.
    Check(CheckArgs),

    /// Manage configuration (show/get/set).
    Config(ConfigArgs),

    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

/// Arguments for `cover evaluate`.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Fact value (name=value), repeatable. `true`/`false` are booleans,
    /// anything else is an enumeration label.
    #[arg(short = 'f', long = "fact", num_args = 1..)]
    pub facts: Vec<String>,

    /// JSON file with one fact object or an array of them. `-` reads stdin.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Ignore facts the rule table does not declare.
    #[arg(long)]
    pub ignore_unknown: bool,

    /// Include resolved facts (defaults applied) in the output.
    #[arg(long)]
    pub trace: bool,
}

/// Arguments for `cover check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Rule table file or name.
    pub file: String,
}

/// Arguments for `cover config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration.
    Show,
    /// Get a configuration value.
    Get(ConfigGetArgs),
    /// Set a configuration value in `.cover/config.yaml`.
    Set(ConfigSetArgs),
}

/// Arguments for `cover config get`.
#[derive(Args, Debug)]
pub struct ConfigGetArgs {
    /// Key: json, rules, unknown_facts or defaults.<fact>.
    pub key: String,
}

/// Arguments for `cover config set`.
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Key: json, rules, unknown_facts or defaults.<fact>.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Arguments for `cover completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
