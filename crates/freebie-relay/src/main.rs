//! `freebie` relay binary.
//!
//! Reads `freebie.toml` (or the path given with `--config`), opens the SQLite
//! ledger, waits for Discord to accept the bot token, reconciles, then polls
//! GamerPower on a fixed period while serving the admin API.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```
//! cargo run -p freebie-relay --bin freebie -- --hash-password
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use freebie_api::{AppState, AuthConfig};
use freebie_discord::{DiscordConfig, DiscordTarget};
use freebie_gamerpower::{GamerPowerClient, SourceConfig};
use freebie_relay::{Engine, RelayConfig, scheduler};
use freebie_store_sqlite::SqliteLedger;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "GamerPower to Discord giveaway relay")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "freebie.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let cfg = RelayConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
  let settings = cfg.engine_settings();

  let ledger = SqliteLedger::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open ledger at {}", cfg.store_path.display()))?;
  let ledger = Arc::new(ledger);

  let source = GamerPowerClient::new(SourceConfig {
    base_url: cfg.source_base_url.clone(),
    timeout:  settings.fetch_timeout,
  })
  .context("failed to build GamerPower client")?;
  let source = Arc::new(source);

  let target = DiscordTarget::connect(DiscordConfig {
    api_base: cfg.discord_api_url.clone(),
    token:    cfg.discord_token.clone(),
    timeout:  settings.delivery_timeout,
  })
  .await
  .context("discord did not accept the bot token")?;

  let cancel = shutdown_signal();

  let mut engine = Engine::new(ledger.clone(), source.clone(), Arc::new(target), settings);
  match engine.reconcile().await {
    Ok(report) => tracing::info!(?report, "startup reconciliation finished"),
    Err(e) => tracing::error!(error = %e, "startup reconciliation failed; retrying next tick"),
  }

  let poller = tokio::spawn(scheduler::run(engine, cfg.poll_interval(), cancel.clone()));

  if cfg.api_enabled {
    let state = AppState {
      ledger,
      source,
      auth: Arc::new(AuthConfig {
        username:      cfg.auth_username.clone(),
        password_hash: cfg.auth_password_hash.clone(),
      }),
    };
    let app = freebie_api::api_router(state);
    let address = format!("{}:{}", cfg.host, cfg.port);

    tracing::info!("Listening on http://{address}");
    let listener = TcpListener::bind(&address)
      .await
      .with_context(|| format!("failed to bind {address}"))?;

    axum::serve(listener, app)
      .with_graceful_shutdown(cancel.clone().cancelled_owned())
      .await
      .context("server error")?;
  } else {
    cancel.cancelled().await;
  }

  // Let an in-flight cycle finish, but do not hang shutdown on it.
  if tokio::time::timeout(Duration::from_secs(60), poller).await.is_err() {
    tracing::warn!("poll cycle still running at shutdown; exiting anyway");
  }
  Ok(())
}

/// A token cancelled on Ctrl-C or, on Unix, SIGTERM.
fn shutdown_signal() -> CancellationToken {
  let token = CancellationToken::new();
  let trigger = token.clone();
  tokio::spawn(async move {
    wait_for_signal().await;
    trigger.cancel();
  });
  token
}

#[cfg(unix)]
async fn wait_for_signal() {
  use tokio::signal::unix::{SignalKind, signal};

  let mut sigterm = match signal(SignalKind::terminate()) {
    Ok(sigterm) => sigterm,
    Err(e) => {
      tracing::warn!(error = %e, "could not listen for SIGTERM; Ctrl-C only");
      return wait_for_ctrl_c().await;
    }
  };

  tokio::select! {
    _ = wait_for_ctrl_c() => {}
    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
  }
}

#[cfg(not(unix))]
async fn wait_for_signal() { wait_for_ctrl_c().await }

async fn wait_for_ctrl_c() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
    // Stay pending: a missing handler must not look like a shutdown request.
    Err(e) => {
      tracing::error!(error = %e, "could not listen for Ctrl-C");
      std::future::pending::<()>().await
    }
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
