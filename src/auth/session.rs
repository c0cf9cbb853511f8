//! Session token lifecycle against the persistent store.
//!
//! Tokens are opaque bearer credentials: 32 random bytes, hex encoded. Expiry
//! is lazy - an expired row is deleted on the validation that discovers it,
//! there is no background sweep.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;

use crate::error::AppResult;
use crate::types::PublicUser;

const TOKEN_LEN: usize = 32;

#[derive(Clone)]
pub struct SessionStore {
    db: SqlitePool,
    expiry_days: i64,
    single_session_per_user: bool,
}

impl SessionStore {
    pub fn new(db: SqlitePool, expiry_days: i64, single_session_per_user: bool) -> Self {
        Self { db, expiry_days, single_session_per_user }
    }

    /// Create a session for `user_id` and return the opaque token.
    ///
    /// The token column is the primary key, so an (astronomically unlikely)
    /// collision surfaces as a storage error instead of silently hijacking an
    /// existing session.
    pub async fn create_session(&self, user_id: i64) -> AppResult<String> {
        if self.single_session_per_user {
            self.revoke_all_for_user(user_id).await?;
        }

        let mut raw = [0u8; TOKEN_LEN];
        rand::rngs::OsRng.fill_bytes(&mut raw);
        let token = hex::encode(raw);

        let now = Utc::now();
        let expires_at = now + Duration::days(self.expiry_days);
        sqlx::query(
            r#"INSERT INTO sessions (token, user_id, created_at, expires_at)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(token)
    }

    /// Resolve a token to its user, or `None` if the session is unknown,
    /// expired or orphaned.
    ///
    /// Store errors are treated conservatively as "not authenticated" rather
    /// than fatal, so a flaky store fails closed without crashing requests.
    pub async fn validate_session(&self, token: &str) -> Option<PublicUser> {
        let row: Option<(i64, String)> = match sqlx::query_as(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("session lookup failed: {}", e);
                return None;
            }
        };

        let (user_id, expires_at) = row?;

        let expired = match DateTime::parse_from_rfc3339(&expires_at) {
            Ok(ts) => ts < Utc::now(),
            // Unparsable expiry is treated as expired
            Err(_) => true,
        };
        if expired {
            if let Err(e) = self.revoke_session(token).await {
                tracing::warn!("failed to delete expired session: {}", e);
            }
            return None;
        }

        match sqlx::query_as::<_, PublicUser>(
            "SELECT id, username, email, created_at FROM users WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        {
            Ok(Some(user)) => Some(user),
            // Orphaned session: invalid, not fatal
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("user lookup for session failed: {}", e);
                None
            }
        }
    }

    /// Delete a session. Idempotent - unknown tokens are not an error.
    pub async fn revoke_session(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Delete every session of a user (single-active-session policy).
    pub async fn revoke_all_for_user(&self, user_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
