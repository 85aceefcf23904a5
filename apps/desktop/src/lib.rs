//! # KasirNest Desktop Library
//!
//! Core library for the KasirNest desktop application: configuration,
//! logging setup, state holders and the commands each screen calls.
//!
//! ## Module Organization
//! ```text
//! kasir_desktop_lib/
//! ├── lib.rs              ◄─── You are here (startup & run)
//! ├── config.rs           ◄─── kasir.toml + KASIR_* environment
//! ├── error.rs            ◄─── API error type for commands
//! ├── state/
//! │   ├── mod.rs          ◄─── State type exports, AppState bundle
//! │   ├── db.rs           ◄─── Database + image store wrapper
//! │   ├── cart.rs         ◄─── Cart state management
//! │   ├── session.rs      ◄─── Logged-in user, session events
//! │   └── config.rs       ◄─── Configuration state
//! └── commands/
//!     ├── mod.rs          ◄─── Command exports
//!     ├── auth.rs         ◄─── Login / logout / register
//!     ├── cart.rs         ◄─── Cart manipulation, checkout
//!     ├── product.rs      ◄─── Product search/CRUD, photos
//!     ├── transaction.rs  ◄─── Sales history
//!     ├── report.rs       ◄─── Sales reports
//!     └── dashboard.rs    ◄─── Home screen counters
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::path::PathBuf;

use anyhow::Context;
use kasir_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::state::AppState;

/// Runs the application.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • --config <path>, else kasir.toml in the platform config dir       │
/// │     • KASIR_* environment variables win over the file                   │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: INFO (DEBUG with app.debug), RUST_LOG overrides          │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • Linux: ~/.local/share/kasirnest/kasir.db                          │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │                                                                         │
/// │  4. Initialize State Objects ─────────────────────────────────────────► │
/// │     • DbState, CartState, SessionState, ConfigState                     │
/// │                                                                         │
/// │  5. Restore Session ──────────────────────────────────────────────────► │
/// │     • session.json from the last run, if under 24 hours old             │
/// │                                                                         │
/// │  6. Dashboard Summary ────────────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn run() -> anyhow::Result<()> {
    let config_path = config_path_from_args(std::env::args().skip(1))
        .or_else(crate::config::default_config_path);
    let config = AppConfig::load_from(config_path.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(config.app.debug);

    info!(
        name = %config.app.name,
        version = %config.app.version,
        config = ?config_path,
        "Starting KasirNest"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(start(config))
}

async fn start(config: AppConfig) -> anyhow::Result<()> {
    if config.security.session_hours != kasir_core::SESSION_VALIDITY_HOURS {
        warn!(
            configured = config.security.session_hours,
            enforced = kasir_core::SESSION_VALIDITY_HOURS,
            "security.session_hours is ignored; sessions last 24 hours"
        );
    }

    let db_path = config.database_path()?;
    info!(db_path = %db_path.display(), "Database path determined");

    let db = Database::new(DbConfig::new(db_path))
        .await
        .context("Failed to open database")?;
    info!("Database connected and migrations applied");

    let state = AppState::new(db, config)?;
    info!(images = %state.db.images().root().display(), "State initialized");

    match commands::auth::restore_session(&state.session, &state.cart).await {
        Some(session) => info!(user_id = %session.user_id, role = %session.role, "Welcome back"),
        None => info!("No active session, showing login"),
    }

    let stats = commands::dashboard::dashboard_stats(&state.db, &state.config).await?;
    info!(
        products = stats.product_count,
        transactions = stats.transaction_count,
        today_sales = %stats.today_sales_display,
        low_stock = stats.low_stock_count,
        "Dashboard"
    );

    state.db.inner().close().await;
    Ok(())
}

/// Picks `--config <path>` (or `-c <path>`) out of the arguments.
fn config_path_from_args(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kasir_db=trace` - Show trace for one crate only
/// - Default: INFO, or DEBUG when `app.debug` is set
fn init_tracing(debug: bool) {
    let default = if debug {
        "debug,sqlx=warn"
    } else {
        "info,kasir=debug,sqlx=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_config_path_from_args() {
        assert_eq!(
            config_path_from_args(args(&["--config", "/tmp/kasir.toml"])),
            Some(PathBuf::from("/tmp/kasir.toml"))
        );
        assert_eq!(
            config_path_from_args(args(&["-v", "-c", "toko.toml"])),
            Some(PathBuf::from("toko.toml"))
        );
        assert_eq!(config_path_from_args(args(&["--config"])), None);
        assert_eq!(config_path_from_args(args(&[])), None);
    }
}
