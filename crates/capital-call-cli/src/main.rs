mod commands;
mod input;
mod logging;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::capital_call::{AllocateArgs, CallArgs};
use commands::hierarchy::{PlanArgs, ResolveArgs};
use logging::LogFormat;

/// Capital call allocation across fund structures
#[derive(Parser)]
#[command(
    name = "ccall",
    version,
    about = "Capital call allocation across fund structures",
    long_about = "Compute capital calls with decimal precision: pro-rata allocation by \
                  commitment, two-level master / intermediate splits, and resolution of \
                  structure hierarchies into the investors to call."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format (logs go to stderr)
    #[arg(long, default_value = "compact", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a capital call for a structure and its investors
    Call(CallArgs),
    /// Allocate an amount pro-rata (or two-level) without a structure
    Allocate(AllocateArgs),
    /// Resolve a structure hierarchy into the investors to call
    Resolve(ResolveArgs),
    /// Resolve a structure hierarchy and calculate the call in one step
    Plan(PlanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, &cli.log_format);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Call(args) => commands::capital_call::run_call(args),
        Commands::Allocate(args) => commands::capital_call::run_allocate(args),
        Commands::Resolve(args) => commands::hierarchy::run_resolve(args),
        Commands::Plan(args) => commands::hierarchy::run_plan(args),
        Commands::Version => {
            println!("ccall {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
