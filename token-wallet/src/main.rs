//! Token Wallet CLI
//!
//! Manage local Solana wallets for a single SPL token.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use token_wallet::commands;
use token_wallet::storage::{FileStorage, HOME_ENV_VAR};
use token_wallet::{Network, WalletManager};

#[derive(Parser)]
#[command(name = "token-wallet")]
#[command(about = "Token wallet - manage your SPL token keys securely")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Wallet data directory
    #[arg(short, long, global = true, env = HOME_ENV_VAR)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Create {
        /// Wallet name
        name: String,

        /// Network for the new wallet (mainnet, devnet, testnet)
        #[arg(short, long)]
        network: Option<Network>,
    },

    /// Import a wallet from its recovery phrase
    Import {
        /// Wallet name
        name: String,

        /// Network for the imported wallet (mainnet, devnet, testnet)
        #[arg(short, long)]
        network: Option<Network>,
    },

    /// List wallets
    List,

    /// Show a wallet's receive address
    Address {
        /// Wallet name (defaults to the active wallet)
        name: Option<String>,
    },

    /// Make a wallet the active one
    Use {
        /// Wallet name
        name: String,
    },

    /// Delete a wallet
    Delete {
        /// Wallet name
        name: String,

        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show a wallet's recovery phrase
    Export {
        /// Wallet name (defaults to the active wallet)
        name: Option<String>,

        /// Also print the 64-byte keypair as a JSON byte array
        #[arg(long)]
        keypair: bool,
    },

    /// Sign a message with a wallet's key
    Sign {
        /// Message to sign
        message: String,

        /// Wallet name (defaults to the active wallet)
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Verify a message signature against an address
    Verify {
        /// Base58 address of the signer
        address: String,

        /// Signed message
        message: String,

        /// Base58 signature
        signature: String,
    },

    /// Show or change configuration
    Config {
        /// Switch network (resets the RPC endpoint)
        #[arg(long)]
        network: Option<Network>,

        /// Set a custom RPC endpoint
        #[arg(long)]
        rpc: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    let manager = Arc::new(WalletManager::new(FileStorage::new(data_dir)));

    let result = match cli.command {
        Commands::Create { name, network } => commands::create::run(&manager, name, network).await,
        Commands::Import { name, network } => commands::import::run(&manager, name, network).await,
        Commands::List => commands::list::run(&manager),
        Commands::Address { name } => commands::address::run(&manager, name),
        Commands::Use { name } => commands::select::run(&manager, &name),
        Commands::Delete { name, yes } => commands::delete::run(&manager, &name, yes),
        Commands::Export { name, keypair } => commands::export::run(&manager, name, keypair).await,
        Commands::Sign { message, wallet } => commands::sign::run(&manager, &message, wallet).await,
        Commands::Verify {
            address,
            message,
            signature,
        } => commands::sign::verify(&address, &message, &signature),
        Commands::Config { network, rpc } => commands::config::run(&manager, network, rpc),
    };

    if let Err(e) = &result {
        commands::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
