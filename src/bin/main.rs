//! EventDAO CLI - user provisioning from the terminal
//!
//!   eventdao serve [--port 4000]                 → user service over an in-memory store
//!   eventdao validate <address>                  → {"valid": bool, ...}
//!   eventdao lookup <address>                    → {"user": {...} | null}
//!   eventdao register <username> <address>       → {"user": {...}}
//!   eventdao update <id> [--username] [--avatar-url]
//!   eventdao session [--username <name>]         → local wallet → session view
//!   eventdao verify-tweet --account-id <id> [--mention @x] [--hashtag #y]
//!   eventdao verify-follow --account-id <id> --target <username>
//!
//! Configuration comes from the environment (and `.env`); flags override.
//! Output is JSON, pretty-printed on a TTY.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use eventdao::core::address::is_valid_address;
use eventdao::logging::{init_logging, LogFormat};
use eventdao::session::SessionState;
use eventdao::store::MemoryUserStore;
use eventdao::verify::{spawn_poll, FollowCheck, PollConfig, TweetCheck, TweetCriteria, VerificationCheck};
use eventdao::{install_signal_handlers, App, AppConfig, LocalWallet, NewUser, Shutdown, UserPatch, WalletAddress, WalletAdapter};

#[derive(Parser)]
#[command(name = "eventdao")]
#[command(about = "EventDAO wallet session and user provisioning", version)]
struct Cli {
    /// User service base URL
    #[arg(long, global = true, env = "EVENTDAO_API_URL")]
    api_url: Option<String>,

    /// Always pretty-print output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve /api/users over an in-memory store
    Serve {
        #[arg(long, env = "EVENTDAO_PORT")]
        port: Option<u16>,
    },
    /// Check an address without touching the network
    Validate { address: String },
    /// Find the profile for a wallet
    Lookup { address: String },
    /// Create a profile
    Register { username: String, address: String },
    /// Update a profile by id
    Update {
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Connect a local wallet and run the session flow
    Session {
        /// Register with this name if the wallet has no profile
        #[arg(long)]
        username: Option<String>,
        /// Base58 32-byte seed for a stable wallet; random if omitted
        #[arg(long)]
        wallet_seed: Option<String>,
    },
    /// Poll until the account has a matching recent tweet
    VerifyTweet {
        #[arg(long)]
        account_id: String,
        #[arg(long)]
        mention: Option<String>,
        #[arg(long)]
        hashtag: Option<String>,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Poll until the account follows the target
    VerifyFollow {
        #[arg(long)]
        account_id: String,
        #[arg(long)]
        target: String,
        #[command(flatten)]
        poll: PollArgs,
    },
}

#[derive(clap::Args)]
struct PollArgs {
    #[arg(long, default_value_t = 5_000)]
    interval_ms: u64,
    #[arg(long, default_value_t = 12)]
    max_attempts: u32,
}

impl PollArgs {
    fn config(&self) -> PollConfig {
        PollConfig::new().with_interval_ms(self.interval_ms).with_max_attempts(self.max_attempts)
    }
}

fn main() {
    init_logging(LogFormat::from_env());
    let cli = Cli::parse();
    let pretty = cli.pretty || std::io::stdout().is_terminal();

    let result = tokio::runtime::Runtime::new()
        .context("Failed to create runtime")
        .and_then(|rt| rt.block_on(run(cli)));

    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

async fn run(cli: Cli) -> anyhow::Result<Value> {
    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }

    match cli.command {
        Command::Serve { port } => cmd_serve(config, port).await,
        Command::Validate { address } => Ok(cmd_validate(&address)),
        Command::Lookup { address } => {
            let app = App::remote(config)?;
            let wallet = WalletAddress::parse(&address)?;
            let user = app.store().find_by_wallet(&wallet).await?;
            Ok(json!({ "user": user }))
        }
        Command::Register { username, address } => {
            let app = App::remote(config)?;
            let wallet = WalletAddress::parse(&address)?;
            let user = app.store().create(NewUser::new(username, wallet)).await?;
            Ok(json!({ "user": user }))
        }
        Command::Update { id, username, avatar_url } => {
            let app = App::remote(config)?;
            let id = id.parse().with_context(|| format!("Invalid user ID: {}", id))?;
            let mut patch = UserPatch::default();
            if let Some(username) = username {
                patch = patch.username(username);
            }
            if let Some(url) = avatar_url {
                patch = patch.avatar_url(url);
            }
            if patch.is_empty() {
                bail!("Nothing to update: pass --username and/or --avatar-url");
            }
            let user = app.store().update(&id, patch).await?;
            Ok(json!({ "user": user }))
        }
        Command::Session { username, wallet_seed } => cmd_session(App::remote(config)?, username, wallet_seed).await,
        Command::VerifyTweet { account_id, mention, hashtag, poll } => {
            let client = Arc::new(config.x_client()?);
            let criteria = TweetCriteria { mention, hashtag };
            let check = TweetCheck { client, account_id, criteria };
            cmd_verify(Arc::new(check), poll.config()).await
        }
        Command::VerifyFollow { account_id, target, poll } => {
            let client = Arc::new(config.x_client()?);
            let check = FollowCheck { client, account_id, target };
            cmd_verify(Arc::new(check), poll.config()).await
        }
    }
}

async fn cmd_serve(config: AppConfig, port: Option<u16>) -> anyhow::Result<Value> {
    let port = port.unwrap_or(config.port);
    let app = App::with_store(config, Arc::new(MemoryUserStore::new()));
    let shutdown = install_signal_handlers();

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(environment = app.config().environment.as_str(), admin = %app.admin_policy().display(), "EventDAO user service");
    eventdao::server::serve(listener, app.router(), shutdown).await?;
    Ok(json!({"status": "stopped"}))
}

fn cmd_validate(address: &str) -> Value {
    let parsed = WalletAddress::parse(address);
    json!({
        "address": address.trim(),
        "valid": is_valid_address(address.trim()),
        "public_key": parsed.is_ok(),
        "error": parsed.err().map(|e| e.to_string()),
    })
}

async fn cmd_session(app: App, username: Option<String>, wallet_seed: Option<String>) -> anyhow::Result<Value> {
    let wallet = match wallet_seed {
        Some(seed) => {
            let bytes = bs58::decode(seed.trim()).into_vec().context("wallet seed is not base58")?;
            let seed: [u8; 32] = bytes.try_into().map_err(|_| anyhow!("wallet seed must decode to 32 bytes"))?;
            LocalWallet::from_seed(seed)
        }
        None => LocalWallet::generate(),
    };

    let session = app.session();
    let mut views = session.subscribe();
    let shutdown = Shutdown::new();
    let driver = session.run(wallet.subscribe(), shutdown.clone());
    wallet.connect();

    let settled = |v: &eventdao::SessionView| {
        matches!(v.state, SessionState::ProfileFound { .. } | SessionState::ProfileMissing { .. } | SessionState::Error { .. })
    };
    let wait = Duration::from_secs(app.config().timeout_secs + 1);
    tokio::time::timeout(wait, views.wait_for(settled))
        .await
        .context("Timed out waiting for profile lookup")?
        .context("Session closed")?;

    if let (Some(name), SessionState::ProfileMissing { .. }) = (username, session.view().state) {
        if let Err(e) = session.register(&name).await {
            info!(error = %e, "registration failed");
        }
    }

    let view = session.view();
    shutdown.trigger();
    let _ = driver.await;

    Ok(json!({
        "wallet": wallet.address(),
        "session": view,
        "redirect": view.redirect(),
        "message": view.message(),
    }))
}

async fn cmd_verify(check: Arc<dyn VerificationCheck>, config: PollConfig) -> anyhow::Result<Value> {
    let handle = spawn_poll(check, config);
    let outcome = handle.outcome().await;
    Ok(json!({ "verified": outcome.is_verified(), "poll": outcome }))
}
