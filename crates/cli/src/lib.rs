pub mod commands;
pub mod logging;
pub mod render;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use vendorly_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "vendorly",
    about = "Vendorly vendor portal",
    long_about = "Browse agreements, purchase orders and invoices, act on pending work, and inspect configuration.",
    after_help = "Examples:\n  vendorly dashboard\n  vendorly list orders --status new --sort amount\n  vendorly shell"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Show counters, pending tasks and recent activity")]
    Dashboard {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List agreements, orders or invoices with search, filter and sort")]
    List(commands::list::ListArgs),
    #[command(about = "Confirm PO-2024-001 and issue its invoice against the seed data")]
    Demo {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Interactive portal session; notifications expire on their own timers")]
    Shell,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        logging::init_logging(&config);
    }

    let result = match cli.command {
        Command::Dashboard { json } => commands::dashboard::run(json),
        Command::List(args) => commands::list::run(&args),
        Command::Demo { json } => commands::demo::run(json),
        Command::Shell => commands::shell::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
