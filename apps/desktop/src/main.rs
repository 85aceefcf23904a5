//! # KasirNest Desktop Application Entry Point
//!
//! ## Startup Sequence
//! 1. Load configuration (file, then environment)
//! 2. Initialize tracing (logging)
//! 3. Determine database path (app data directory)
//! 4. Connect to database & run migrations
//! 5. Create state objects (DbState, CartState, SessionState, ConfigState)
//! 6. Restore the previous session
//!
//! The setup lives in lib.rs so it can be tested.

fn main() -> anyhow::Result<()> {
    kasir_desktop_lib::run()
}
