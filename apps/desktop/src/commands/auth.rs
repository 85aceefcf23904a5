//! # Auth Commands
//!
//! Login, logout and account registration.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Login screen (email, password)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_email ──► ValidationError                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users().authenticate() ──► InvalidCredentials                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Session::start(user, now) ──► SessionState::begin ──► LoggedIn        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Fresh cart owned by the user                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use kasir_core::validation::{
    validate_email, validate_length, validate_password_strength, FieldErrors,
};
use kasir_core::{Role, Session, User};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::{CartState, DbState, SessionState};

/// What the screens need to know about the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionInfo {
    fn from(s: &Session) -> Self {
        SessionInfo {
            user_id: s.user_id.clone(),
            email: s.email.clone(),
            name: s.name.clone(),
            role: s.role,
            issued_at: s.issued_at,
            expires_at: s.expires_at(),
        }
    }
}

/// Logs a user in and starts an empty cart for them.
///
/// ## Errors
/// - `ValidationError` for a malformed email or empty password
/// - `InvalidCredentials` for an unknown email or a wrong password
pub async fn login(
    db: &DbState,
    session: &SessionState,
    cart: &CartState,
    email: String,
    password: String,
) -> ApiResult<SessionInfo> {
    debug!(email = %email, "login command");

    validate_email(&email)?;
    validate_length("password", &password, 1, 128)?;

    let user = db.inner().users().authenticate(&email, &password).await?;
    let started = Session::start(&user, Utc::now());

    session.begin(started.clone()).await;
    cart.reset(&user.id);

    Ok(SessionInfo::from(&started))
}

/// Ends the session and throws away the open cart.
pub async fn logout(session: &SessionState, cart: &CartState) {
    debug!("logout command");

    session.end().await;
    cart.reset(String::new());
}

/// The logged-in user, if the session is still valid.
pub async fn current_session(session: &SessionState) -> Option<SessionInfo> {
    session
        .current(Utc::now())
        .await
        .map(|s| SessionInfo::from(&s))
}

/// Picks up the session saved by the previous run.
///
/// Returns `None` when there is nothing to restore or it has expired.
pub async fn restore_session(session: &SessionState, cart: &CartState) -> Option<SessionInfo> {
    let restored = session.restore(Utc::now()).await?;
    cart.reset(&restored.user_id);
    Some(SessionInfo::from(&restored))
}

/// Registers a new cashier or admin. Admin only.
///
/// All fields are checked before anything is written; the error message lists
/// every failing field.
pub async fn register_user(
    db: &DbState,
    session: &SessionState,
    email: String,
    name: String,
    role: String,
    password: String,
) -> ApiResult<User> {
    session.require_admin(Utc::now(), "Register user").await?;
    debug!(email = %email, role = %role, "register_user command");

    let mut errors = FieldErrors::new();
    errors.check("email", validate_email(&email));
    errors.check("name", validate_length("name", name.trim(), 1, 100));
    errors.check("password", validate_password_strength(&password));
    let role = match role.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            errors.add("role", e.to_string());
            None
        }
    };
    errors.into_result()?;

    let role = role.unwrap_or_default();
    let user = db
        .inner()
        .users()
        .create(&email, &name, role, &password)
        .await?;

    info!(id = %user.id, role = %user.role, "User registered");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::testing::{self, ADMIN_EMAIL, PASSWORD};
    use kasir_core::SessionEvent;

    #[tokio::test]
    async fn test_login_starts_session_and_cart() {
        let (state, _dir) = testing::app().await;
        let admin = state
            .db
            .inner()
            .users()
            .create(ADMIN_EMAIL, "Admin", Role::Admin, PASSWORD)
            .await
            .unwrap();
        let mut events = state.session.subscribe();

        let info = login(
            &state.db,
            &state.session,
            &state.cart,
            "  Admin@Toko.id ".into(),
            PASSWORD.into(),
        )
        .await
        .unwrap();

        assert_eq!(info.user_id, admin.id);
        assert_eq!(info.role, Role::Admin);
        assert_eq!(info.expires_at - info.issued_at, Session::validity());
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::LoggedIn { .. }
        ));
        assert_eq!(state.cart.with_cart(|c| c.user_id.clone()), admin.id);
        assert!(current_session(&state.session).await.is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_input() {
        let (state, _dir) = testing::app().await;
        state
            .db
            .inner()
            .users()
            .create(ADMIN_EMAIL, "Admin", Role::Admin, PASSWORD)
            .await
            .unwrap();

        let err = login(
            &state.db,
            &state.session,
            &state.cart,
            "not-an-email".into(),
            PASSWORD.into(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = login(
            &state.db,
            &state.session,
            &state.cart,
            ADMIN_EMAIL.into(),
            "Salah123".into(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert!(current_session(&state.session).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_cart() {
        let (state, _dir) = testing::app().await;
        testing::login_as(&state, Role::Cashier).await;
        let kopi = testing::stock_product(&state, "kopi", 15000, 10).await;
        state.cart.with_cart_mut(|c| c.add_item(&kopi, 2)).unwrap();

        logout(&state.session, &state.cart).await;

        assert!(current_session(&state.session).await.is_none());
        assert!(state.cart.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_register_user_requires_admin() {
        let (state, _dir) = testing::app().await;
        testing::login_as(&state, Role::Cashier).await;

        let err = register_user(
            &state.db,
            &state.session,
            "baru@toko.id".into(),
            "Baru".into(),
            "kasir".into(),
            "Rahasia1".into(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_register_user_collects_field_errors() {
        let (state, _dir) = testing::app().await;
        testing::login_as(&state, Role::Admin).await;

        let err = register_user(
            &state.db,
            &state.session,
            "bad".into(),
            " ".into(),
            "owner".into(),
            "weak".into(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        for field in ["email", "name", "password", "role"] {
            assert!(err.message.contains(field), "missing {field} in {}", err.message);
        }

        let user = register_user(
            &state.db,
            &state.session,
            "baru@toko.id".into(),
            "Baru".into(),
            "kasir".into(),
            "Rahasia1".into(),
        )
        .await
        .unwrap();
        assert_eq!(user.role, Role::Cashier);
    }
}
