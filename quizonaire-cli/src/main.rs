mod commands;
mod config;
mod input;

use clap::{Parser, Subcommand};
use commands::AppContext;
use config::CliConfig;
use quizonaire_core::{QuizConfig, QuizonaireError, TransactionError};
use quizonaire_game::GameError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quizonaire")]
#[command(about = "Quizonaire - stake on your knowledge of any topic")]
#[command(version)]
struct Cli {
    /// Data directory for game history
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the in-process contract and the bundled quiz deck
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a quiz, stake on it and play
    Play(commands::PlayArgs),

    /// Generate a quiz and show its questions and costs without staking
    Preview(commands::PreviewArgs),

    /// Contract owner commands
    #[command(subcommand)]
    Owner(commands::OwnerCommands),

    /// Show past games
    History {
        /// Number of games to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Explain how the game works
    Rules,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut cli_config = CliConfig {
        verbose: cli.verbose,
        offline: cli.offline,
        ..CliConfig::default()
    };
    if let Some(data_dir) = cli.data_dir {
        cli_config.data_dir = data_dir;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(cli_config.log_filter()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tokio::fs::create_dir_all(&cli_config.data_dir).await?;

    let quiz_config = QuizConfig::from_env()?;
    quiz_config.validate()?;

    let ctx = AppContext::new(cli_config, quiz_config);

    let result = match cli.command {
        Commands::Play(args) => commands::handle_play(args, &ctx).await,
        Commands::Preview(args) => commands::handle_preview(args, &ctx).await,
        Commands::Owner(cmd) => commands::handle_owner_command(cmd, &ctx).await,
        Commands::History { limit } => commands::handle_history(limit, &ctx).await,
        Commands::Rules => commands::handle_rules(&ctx),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }

    Ok(())
}

fn report(error: &anyhow::Error) {
    let transaction = error
        .downcast_ref::<TransactionError>()
        .or_else(|| error.downcast_ref::<GameError>().and_then(|e| e.transaction()));

    if let Some(tx) = transaction {
        match tx {
            TransactionError::UserRejected => {
                eprintln!("Error: The transaction was rejected in the wallet");
            }
            TransactionError::ChainMismatch { expected, actual } => {
                eprintln!("Error: Connected to chain {}, expected {}", actual, expected);
                eprintln!("Check QUIZONAIRE_RPC_URL and QUIZONAIRE_CHAIN_ID");
            }
            TransactionError::NotOwner { account } => {
                eprintln!("Error: {} is not the contract owner", account);
            }
            TransactionError::NotConnected => {
                eprintln!("Error: No account available to sign transactions");
                eprintln!("Set QUIZONAIRE_ACCOUNT or unlock an account on the node");
            }
            TransactionError::Unconfirmed { tx_hash, reason } => {
                eprintln!("Error: Transaction {} was sent but not confirmed: {}", tx_hash, reason);
                eprintln!("Check whether it was mined before sending it again");
            }
            other if other.is_transient() => {
                eprintln!("Error: {}", other);
                eprintln!("The node reported a temporary problem, try again shortly");
            }
            other => eprintln!("Error: {}", other),
        }
        return;
    }

    match error.downcast_ref::<QuizonaireError>() {
        Some(QuizonaireError::Config(msg)) => {
            eprintln!("Configuration error: {}", msg);
            eprintln!("Use --offline to play without a node or API key");
        }
        _ => eprintln!("Error: {:#}", error),
    }
}
