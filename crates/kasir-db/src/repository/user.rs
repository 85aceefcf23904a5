//! # User Repository
//!
//! Cashier and admin accounts. Passwords are stored as argon2 PHC strings and
//! never leave this module.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kasir_core::{Role, User};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    role: Role,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
            last_login: row.last_login,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: String,
    password_hash: String,
}

const SELECT_USER: &str = "SELECT id, email, name, role, created_at, last_login FROM users";

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a new account.
    ///
    /// The email is stored trimmed and lowercased. Input validation (email
    /// format, password strength) is the caller's job.
    ///
    /// ## Errors
    /// `UniqueViolation` if the email is already registered.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: &str,
    ) -> DbResult<User> {
        let email = normalize_email(email);
        debug!(email = %email, role = %role, "Creating user");

        let password_hash = hash_password(password.to_string()).await?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            name: name.trim().to_string(),
            role,
            created_at: Utc::now(),
            last_login: None,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role)
        .bind(&password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &user.email),
            other => other,
        })?;

        info!(id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Checks an email/password pair and records the login time.
    ///
    /// ## Errors
    /// `InvalidCredentials` for an unknown email or a wrong password; the two
    /// cases are not distinguished.
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<User> {
        let email = normalize_email(email);
        debug!(email = %email, "Authenticating user");

        let creds: Option<CredentialRow> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;

        let Some(creds) = creds else {
            warn!(email = %email, "Login failed: unknown email");
            return Err(DbError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), creds.password_hash).await? {
            warn!(email = %email, "Login failed: wrong password");
            return Err(DbError::InvalidCredentials);
        }

        let now = Utc::now();
        self.touch_last_login(&creds.id, now).await?;

        self.get_by_id(&creds.id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &creds.id))
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Gets a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE email = ?1"))
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Records a successful login.
    pub async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET last_login = ?2 WHERE id = ?1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// All users ordered by name.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} ORDER BY name COLLATE NOCASE"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update_display_name(&self, id: &str, name: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// Password Hashing
// =============================================================================
// Both run on the blocking pool.

async fn hash_password(password: String) -> DbResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DbError::Internal(format!("Failed to hash password: {e}")))
    })
    .await
    .map_err(|e| DbError::Internal(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> DbResult<bool> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| DbError::Internal(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();

        let created = users
            .create(" Siti@Toko.ID ", "Siti", Role::Cashier, "Rahasia1")
            .await
            .unwrap();
        assert_eq!(created.email, "siti@toko.id");
        assert!(created.last_login.is_none());

        let logged_in = users.authenticate("siti@toko.id", "Rahasia1").await.unwrap();
        assert_eq!(logged_in.id, created.id);
        assert_eq!(logged_in.role, Role::Cashier);
        assert!(logged_in.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        users
            .create("admin@toko.id", "Admin", Role::Admin, "Rahasia1")
            .await
            .unwrap();

        assert!(matches!(
            users.authenticate("admin@toko.id", "salah").await,
            Err(DbError::InvalidCredentials)
        ));
        assert!(matches!(
            users.authenticate("ghost@toko.id", "Rahasia1").await,
            Err(DbError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        users
            .create("a@toko.id", "A", Role::Cashier, "Rahasia1")
            .await
            .unwrap();

        let err = users
            .create("A@TOKO.ID", "A2", Role::Cashier, "Rahasia1")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_list_rename_delete() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        let budi = users
            .create("budi@toko.id", "Budi", Role::Cashier, "Rahasia1")
            .await
            .unwrap();
        users
            .create("ani@toko.id", "Ani", Role::Admin, "Rahasia1")
            .await
            .unwrap();

        let names: Vec<_> = users.list().await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Ani", "Budi"]);

        users.update_display_name(&budi.id, "Budi S.").await.unwrap();
        let fetched = users.get_by_email("BUDI@toko.id").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Budi S.");

        users.delete(&budi.id).await.unwrap();
        assert_eq!(users.count().await.unwrap(), 1);
        assert!(matches!(users.delete(&budi.id).await, Err(DbError::NotFound { .. })));
    }
}
