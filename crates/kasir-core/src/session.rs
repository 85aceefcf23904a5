//! # Session
//!
//! The logged-in user, held as an explicit value by the desktop shell.
//!
//! A session is valid for a fixed [`SESSION_VALIDITY_HOURS`] after login:
//! `now - issued_at < 24h`. There is no sliding renewal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User};
use crate::SESSION_VALIDITY_HOURS;

/// Who is logged in, and since when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for `user` at `now`.
    pub fn start(user: &User, now: DateTime<Utc>) -> Self {
        Session {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            issued_at: now,
        }
    }

    pub fn validity() -> Duration {
        Duration::hours(SESSION_VALIDITY_HOURS)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Self::validity()
    }

    /// Valid from `issued_at` for 24 hours. A session issued after `now`
    /// (clock moved back, edited session file) is not valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.issued_at && now - self.issued_at < Self::validity()
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        let left = self.expires_at() - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `SessionExpired` when the session is no longer valid.
    pub fn ensure_valid(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.is_valid_at(now) {
            Ok(())
        } else {
            Err(CoreError::SessionExpired)
        }
    }

    /// Fails unless the session is valid and belongs to an admin.
    pub fn ensure_admin(&self, now: DateTime<Utc>, action: &str) -> CoreResult<()> {
        self.ensure_valid(now)?;
        if !self.is_admin() {
            return Err(CoreError::Unauthorized {
                action: action.to_string(),
                required: Role::Admin.to_string(),
            });
        }
        Ok(())
    }
}

/// Published whenever the current session changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { user_id: String, role: Role },
    LoggedOut { user_id: String },
    Expired { user_id: String },
}
