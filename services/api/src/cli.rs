use crate::diagnose::{run_diagnose, DiagnoseArgs};
use crate::rulebook::{run_rules_check, run_rules_export, RulesCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use visa_pathway::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Visa Pathway Engine",
    about = "Score and rank visa pathways toward residence goals, or serve them over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Diagnose a single profile from flags or a CSV batch of profiles
    Diagnose(DiagnoseArgs),
    /// Inspect and validate rule books
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Print the bundled rule book as JSON
    Export,
    /// Validate a rule book file and print its summary
    Check(RulesCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the rule book from this JSON file instead of RULES_PATH
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Diagnose(args) => run_diagnose(args),
        Command::Rules {
            command: RulesCommand::Export,
        } => run_rules_export(),
        Command::Rules {
            command: RulesCommand::Check(args),
        } => run_rules_check(args),
    }
}
