use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinrates::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Answer from stored rates without contacting any feed
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for coinrates::AppCommand {
    fn from(cmd: Commands) -> coinrates::AppCommand {
        match cmd {
            Commands::List => coinrates::AppCommand::List,
            Commands::Search { query } => coinrates::AppCommand::Search(query),
            Commands::Rate { code } => coinrates::AppCommand::Rate(code),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List all exchange rates
    List,
    /// Find rates by currency code or symbol
    Search {
        /// Case-insensitive text matched against code and symbol
        query: String,
    },
    /// Show the rate for one currency, falling back to the locale currency
    Rate {
        /// ISO currency code, e.g. EUR
        code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinrates::cli::setup::setup(),
        Some(cmd) => {
            coinrates::run_command(cmd.into(), cli.config_path.as_deref(), cli.offline).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
