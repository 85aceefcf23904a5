//! # Session State
//!
//! Who is logged in. The session is an explicit value held here; commands
//! that need it receive `&SessionState`.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   login ──► begin(session) ──► LoggedIn ──┐                            │
//! │                  │                         │                            │
//! │                  ▼                         ▼                            │
//! │            session.json            broadcast::Sender<SessionEvent>     │
//! │                  │                         │                            │
//! │   restart ──► restore(now) ────────────────┤ (LoggedIn or Expired)     │
//! │                                            │                            │
//! │   any command ──► current(now)             │                            │
//! │                     └─ older than 24h ─────┤ Expired                   │
//! │                                            │                            │
//! │   logout ──► end() ────────────────────────┘ LoggedOut                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers call [`SessionState::subscribe`]. Sends never fail when no one
//! is listening.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use kasir_core::{Session, SessionEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct SessionState {
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
    /// Where the session survives restarts; `None` keeps it in memory only.
    file: Option<PathBuf>,
}

impl SessionState {
    pub fn new(file: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SessionState {
            current: Mutex::new(None),
            events,
            file,
        }
    }

    /// Registers a listener for session changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The current session if it is still valid at `now`.
    ///
    /// An expired session is dropped here and `Expired` is published.
    pub async fn current(&self, now: DateTime<Utc>) -> Option<Session> {
        let expired = {
            let mut guard = self.current.lock().expect("Session mutex poisoned");
            match guard.as_ref().map(|s| s.is_valid_at(now)) {
                None => return None,
                Some(true) => return guard.clone(),
                Some(false) => guard.take(),
            }
        };

        if let Some(session) = expired {
            info!(user_id = %session.user_id, "Session expired");
            self.remove_file().await;
            self.publish(SessionEvent::Expired {
                user_id: session.user_id,
            });
        }
        None
    }

    /// The current session, or `SessionExpired`.
    pub async fn require(&self, now: DateTime<Utc>) -> ApiResult<Session> {
        self.current(now).await.ok_or_else(ApiError::not_logged_in)
    }

    /// The current session if it belongs to an admin.
    pub async fn require_admin(&self, now: DateTime<Utc>, action: &str) -> ApiResult<Session> {
        let session = self.require(now).await?;
        session.ensure_admin(now, action)?;
        Ok(session)
    }

    /// Makes `session` current, persists it and publishes `LoggedIn`.
    pub async fn begin(&self, session: Session) {
        {
            let mut guard = self.current.lock().expect("Session mutex poisoned");
            *guard = Some(session.clone());
        }
        self.write_file(&session).await;

        info!(user_id = %session.user_id, role = %session.role, "Session started");
        self.publish(SessionEvent::LoggedIn {
            user_id: session.user_id,
            role: session.role,
        });
    }

    /// Ends the current session. Returns it, if there was one.
    pub async fn end(&self) -> Option<Session> {
        let ended = self
            .current
            .lock()
            .expect("Session mutex poisoned")
            .take();
        self.remove_file().await;

        if let Some(session) = &ended {
            info!(user_id = %session.user_id, "Session ended");
            self.publish(SessionEvent::LoggedOut {
                user_id: session.user_id.clone(),
            });
        }
        ended
    }

    /// Loads the session saved by a previous run.
    ///
    /// A missing, unreadable or expired file yields `None`; an expired one
    /// also publishes `Expired`.
    pub async fn restore(&self, now: DateTime<Utc>) -> Option<Session> {
        let path = self.file.as_ref()?;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read session file");
                return None;
            }
        };

        let session: Session = match serde_json::from_slice(&bytes) {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding corrupt session file");
                self.remove_file().await;
                return None;
            }
        };

        if !session.is_valid_at(now) {
            debug!(user_id = %session.user_id, "Saved session is expired");
            self.remove_file().await;
            self.publish(SessionEvent::Expired {
                user_id: session.user_id,
            });
            return None;
        }

        {
            let mut guard = self.current.lock().expect("Session mutex poisoned");
            *guard = Some(session.clone());
        }
        info!(user_id = %session.user_id, "Session restored");
        self.publish(SessionEvent::LoggedIn {
            user_id: session.user_id.clone(),
            role: session.role,
        });
        Some(session)
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    async fn write_file(&self, session: &Session) {
        let Some(path) = &self.file else { return };

        let result = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let json = serde_json::to_vec_pretty(session)?;
            tokio::fs::write(path, json).await?;
            Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
        }
        .await;

        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Could not save session file");
        }
    }

    async fn remove_file(&self) {
        let Some(path) = &self.file else { return };
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not remove session file"),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(None)
    }
}
