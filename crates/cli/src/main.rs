//! Minibank CLI - main entry point

use clap::{Parser, Subcommand};
use minibank_cli::{commands, AppContext, Config};
use minibank_core::Amount;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minibank")]
#[command(about = "Minibank - simulated bank ledger", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store and the reserve account
    Init,

    /// Register a new user account
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Log in and print a bearer token
    Login { username: String, password: String },

    /// Invalidate a bearer token
    Logout {
        #[arg(long)]
        token: String,
    },

    /// Show the account behind a token
    Whoami {
        #[arg(long)]
        token: String,
    },

    /// Change the caller's password (invalidates all sessions)
    ChangePassword {
        current: String,
        new: String,
        #[arg(long)]
        token: String,
    },

    /// Show the caller's balance
    Balance {
        #[arg(long)]
        token: String,
    },

    /// Transfer money to a username or account number
    Transfer {
        /// Recipient (username or account number)
        to: String,
        /// Amount to transfer
        amount: Amount,
        /// Free-text description
        #[arg(default_value = "")]
        description: String,
        #[arg(long)]
        token: String,
    },

    /// List the caller's transactions, newest first
    Transactions {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long)]
        token: String,
    },

    /// Ask another account for money
    Request {
        /// Who to ask (username or account number)
        target: String,
        /// Amount requested
        amount: Amount,
        /// Why
        reason: String,
        /// Optional note to the target
        #[arg(default_value = "")]
        message: String,
        #[arg(long)]
        token: String,
    },

    /// List the caller's incoming and outgoing payment requests
    Requests {
        #[arg(long)]
        token: String,
    },

    /// Approve an incoming payment request (pays the requester)
    Approve {
        id: i64,
        #[arg(long)]
        token: String,
    },

    /// Reject an incoming payment request
    Reject {
        id: i64,
        #[arg(long)]
        token: String,
    },

    /// Cancel an outgoing payment request
    Cancel {
        id: i64,
        #[arg(long)]
        token: String,
    },

    /// Apply a signed admin adjustment to an account's balance
    Adjust {
        /// Target (username or account number)
        target: String,
        /// Signed delta; negative debits
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        /// Free-text description
        #[arg(default_value = "")]
        description: String,
        #[arg(long)]
        admin_key: String,
    },

    /// List all accounts (admin)
    Users {
        #[arg(long)]
        admin_key: String,
    },

    /// Show the caller's virtual card
    Card {
        #[arg(long)]
        token: String,
    },

    /// Refresh the caller's virtual card (once per day)
    RefreshCard {
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ambient configuration is read once here and passed down explicitly.
    let config = Config {
        data_dir: cli.data,
        webhook_url: std::env::var("WEBHOOK_URL").ok(),
        admin_key: std::env::var("MINIBANK_ADMIN_KEY").ok(),
    };

    let ctx = AppContext::new(config).await?;

    match cli.command {
        Commands::Init => commands::init(&ctx).await?,
        Commands::Register {
            username,
            email,
            password,
        } => commands::register(&ctx, &username, &email, &password).await?,
        Commands::Login { username, password } => {
            commands::login(&ctx, &username, &password).await?
        }
        Commands::Logout { token } => commands::logout(&ctx, &token).await?,
        Commands::Whoami { token } => commands::whoami(&ctx, &token).await?,
        Commands::ChangePassword {
            current,
            new,
            token,
        } => commands::change_password(&ctx, &token, &current, &new).await?,
        Commands::Balance { token } => commands::balance(&ctx, &token).await?,
        Commands::Transfer {
            to,
            amount,
            description,
            token,
        } => commands::transfer(&ctx, &token, &to, amount, &description).await?,
        Commands::Transactions { limit, token } => {
            commands::transactions(&ctx, &token, limit).await?
        }
        Commands::Request {
            target,
            amount,
            reason,
            message,
            token,
        } => commands::request(&ctx, &token, &target, amount, &reason, &message).await?,
        Commands::Requests { token } => commands::requests(&ctx, &token).await?,
        Commands::Approve { id, token } => commands::approve(&ctx, &token, id).await?,
        Commands::Reject { id, token } => commands::reject(&ctx, &token, id).await?,
        Commands::Cancel { id, token } => commands::cancel(&ctx, &token, id).await?,
        Commands::Adjust {
            target,
            amount,
            description,
            admin_key,
        } => commands::adjust(&ctx, &admin_key, &target, amount, &description).await?,
        Commands::Users { admin_key } => commands::users(&ctx, &admin_key).await?,
        Commands::Card { token } => commands::card(&ctx, &token).await?,
        Commands::RefreshCard { token } => commands::refresh_card(&ctx, &token).await?,
    }

    // Let any fire-and-forget webhooks finish before the process exits.
    ctx.notifier.drain().await;

    Ok(())
}
