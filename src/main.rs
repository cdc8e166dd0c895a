//! Command-line client for the Seka lobby
//!
//! Opens a lobby session against a game server, then lists tables, watches
//! lobby activity, or creates and joins tables from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use seka_lobby::config::{validate_config, AppConfig};
use seka_lobby::identity::{
    load_or_create_identity, CredentialStore, FileCredentialStore, InMemoryCredentialStore,
};
use seka_lobby::lobby::{LobbySession, SessionOptions};
use seka_lobby::transport::socket::SocketSettings;
use seka_lobby::transport::{HttpGameApi, WebSocketTransport};
use seka_lobby::types::{LobbyNotice, LobbySnapshot, NewTable, OnlineUser};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// Seka Lobby - realtime lobby client for the Seka card game
#[derive(Parser)]
#[command(
    name = "seka-lobby",
    version,
    about = "Lobby client for the Seka card game server",
    long_about = "Connects to a Seka game server, announces presence in the lobby, \
                 and lets you list, watch, create and join tables."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// REST API URL override
    #[arg(long, value_name = "URL", help = "Override game server API URL")]
    api_url: Option<String>,

    /// Event socket URL override
    #[arg(long, value_name = "URL", help = "Override game server socket URL")]
    socket_url: Option<String>,

    /// Email used when a new identity is created
    #[arg(long, value_name = "EMAIL")]
    email: Option<String>,

    /// Auth token used when a new identity is created
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the visible tables and exit
    Tables,
    /// Stay connected and print lobby activity until Ctrl+C
    Watch,
    /// Create a table and invite online users
    Create {
        /// Table name
        name: String,
        /// Entry fee (ante)
        #[arg(long)]
        ante: f64,
        /// Seats at the table
        #[arg(long, default_value_t = 6)]
        max_players: u32,
        /// Only the creator and invited users can see the table
        #[arg(long)]
        private: bool,
        /// User ids to invite; must be online
        #[arg(long = "invite", value_name = "USER_ID")]
        invite: Vec<String>,
    },
    /// Join an existing table
    Join {
        /// Table id
        table: String,
    },
    /// Forget the stored identity
    Logout,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration and apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(api_url) = &args.api_url {
        config.server.api_url = api_url.clone();
    }

    if let Some(socket_url) = &args.socket_url {
        config.server.socket_url = socket_url.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

fn credential_store(config: &AppConfig) -> Result<Box<dyn CredentialStore>> {
    Ok(match &config.session.credentials_file {
        Some(path) => Box::new(FileCredentialStore::open(path)?),
        None => Box::new(InMemoryCredentialStore::new()),
    })
}

fn print_tables(snapshot: &LobbySnapshot) {
    if snapshot.tables.is_empty() {
        println!("No open tables");
        return;
    }
    for table in &snapshot.tables {
        println!(
            "{:<24} {:<24} ante {:>8.2}  {}/{}  {}{}",
            table.id,
            table.table_name,
            table.entry_fee,
            table.current_players,
            table.max_players,
            table.status,
            if table.is_private { "  (private)" } else { "" }
        );
    }
}

fn print_notice(notice: &LobbyNotice) {
    match notice {
        LobbyNotice::ConnectionChanged(status) => println!("connection: {}", status),
        LobbyNotice::InviteReceived(invite) => println!(
            "invite {} from {} to '{}' (ante {:.2})",
            invite.timestamp, invite.from_email, invite.table_name, invite.entry_fee
        ),
        LobbyNotice::InviteAccepted { by_user_id, .. } => {
            println!("{} accepted your invite", by_user_id)
        }
        LobbyNotice::InviteDeclined { by_user_id, .. } => {
            println!("{} declined your invite", by_user_id)
        }
        LobbyNotice::TableCreated(table) => {
            println!("table created: {} ({})", table.table_name, table.id)
        }
        LobbyNotice::TableRemoved(id) => println!("table removed: {}", id),
        LobbyNotice::OperationFailed { operation, message } => {
            println!("{} failed: {}", operation, message)
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

async fn run(session: &LobbySession, command: Command) -> Result<()> {
    match command {
        Command::Tables => print_tables(&session.snapshot()?),
        Command::Watch => {
            let mut notices = session.subscribe();
            print_tables(&session.snapshot()?);
            let printer = tokio::spawn(async move {
                loop {
                    match notices.recv().await {
                        Ok(notice) => print_notice(&notice),
                        Err(RecvError::Lagged(missed)) => warn!("Missed {} lobby notices", missed),
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            wait_for_shutdown_signal().await;
            printer.abort();
        }
        Command::Create {
            name,
            ante,
            max_players,
            private,
            invite,
        } => {
            let online = session.snapshot()?.online_users;
            let invitees: Vec<OnlineUser> = invite
                .iter()
                .filter_map(|id| {
                    let user = online.iter().find(|u| &u.user_id == id).cloned();
                    if user.is_none() {
                        warn!("Skipping invite for '{}': user is not online", id);
                    }
                    user
                })
                .collect();

            let route = session
                .create_table(NewTable {
                    table_name: name,
                    entry_fee: ante,
                    max_players,
                    is_private: private,
                    invitees,
                })
                .await?;
            println!("Created table {}", route.table_id);
        }
        Command::Join { table } => {
            let route = session.join_table(&table).await?;
            println!("Joined table {}", route.table_id);
        }
        // Handled before the session opens
        Command::Logout => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let store = credential_store(&config)?;
    if matches!(args.command, Command::Logout) {
        store.clear()?;
        println!("Stored identity removed");
        return Ok(());
    }

    let identity = load_or_create_identity(
        store.as_ref(),
        args.email.as_deref(),
        args.token.as_deref(),
    )?;
    info!(
        "{} v{} as '{}'",
        config.service.name,
        seka_lobby::VERSION,
        identity.email
    );

    let api = HttpGameApi::new(&config.server, Some(identity.auth_token.clone()))?;
    let transport = WebSocketTransport::new(SocketSettings::from(&config.server));
    let session = LobbySession::new(
        identity,
        Arc::new(api),
        Arc::new(transport),
        SessionOptions::from(&config),
    );

    if let Err(e) = session.open().await {
        error!("Failed to open lobby session: {}", e);
        std::process::exit(1);
    }

    let result = run(&session, args.command).await;
    session.close().await?;
    result
}
