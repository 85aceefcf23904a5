//! # State Module
//!
//! Application state for the desktop shell.
//!
//! Each command declares only the state it needs, so the holders stay
//! separate; [`AppState`] just bundles them for startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │   DbState    │ │  CartState   │ │ SessionState │ │ ConfigState  │   │
//! │  │              │ │              │ │              │ │              │   │
//! │  │  Database    │ │  Arc<Mutex<  │ │  Mutex<      │ │  AppConfig   │   │
//! │  │  ImageStore  │ │  Transaction │ │  Option<     │ │  (read-only) │   │
//! │  │              │ │  >>          │ │  Session>>   │ │              │   │
//! │  │              │ │              │ │  + broadcast │ │              │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState: Protected by Arc<Mutex<T>> for exclusive access          │
//! │  • SessionState: Mutex, never held across an .await                    │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;
mod session;

pub use self::cart::{CartState, CartTotals};
pub use self::config::ConfigState;
pub use self::db::DbState;
pub use self::session::SessionState;

use kasir_db::{Database, ImageStore};

use crate::config::{AppConfig, ConfigError};

/// All state holders, built once at startup.
#[derive(Debug)]
pub struct AppState {
    pub db: DbState,
    pub cart: CartState,
    pub session: SessionState,
    pub config: ConfigState,
}

impl AppState {
    /// Builds the state around an open database, taking the image folder and
    /// session file location from `config`.
    pub fn new(db: Database, config: AppConfig) -> Result<Self, ConfigError> {
        let images = ImageStore::new(config.images_dir()?);
        let session_file = config.session_file()?;

        Ok(AppState {
            db: DbState::new(db, images),
            cart: CartState::default(),
            session: SessionState::new(session_file),
            config: ConfigState::new(config),
        })
    }
}
