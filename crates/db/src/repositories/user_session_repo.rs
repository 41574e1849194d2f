//! Repository for `user_sessions`, the refresh-token store.

use cinema_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::user_session::{CreateUserSession, UserSession};

const SESSION_COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, revoked_at, \
                               user_agent, ip_address, created_at";

pub struct UserSessionRepo;

impl UserSessionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateUserSession,
    ) -> Result<UserSession, sqlx::Error> {
        Self::insert(pool, input).await
    }

    /// A session that is neither revoked nor expired.
    pub async fn find_by_refresh_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions
             WHERE refresh_token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()"
        );
        sqlx::query_as::<_, UserSession>(&sql)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Swap session `old_id` for a new one in one transaction.
    ///
    /// Returns `None`, and stores nothing, if `old_id` was already revoked,
    /// so a refresh token can be exchanged at most once.
    pub async fn rotate(
        pool: &PgPool,
        old_id: DbId,
        next: &CreateUserSession,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if !Self::revoke_one(&mut *tx, old_id).await? {
            return Ok(None);
        }
        let session = Self::insert(&mut *tx, next).await?;
        tx.commit().await?;
        Ok(Some(session))
    }

    /// Revoke every live session of a user; returns how many there were.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(done.rows_affected())
    }

    /// Delete sessions that can no longer be used.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let done = sqlx::query(
            "DELETE FROM user_sessions WHERE revoked_at IS NOT NULL OR expires_at <= NOW()",
        )
        .execute(pool)
        .await?;
        Ok(done.rows_affected())
    }

    async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateUserSession,
    ) -> Result<UserSession, sqlx::Error> {
        let sql = format!(
            "INSERT INTO user_sessions
                 (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&sql)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(input.user_agent.as_deref())
            .bind(input.ip_address.as_deref())
            .fetch_one(executor)
            .await
    }

    async fn revoke_one<'e>(executor: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(done.rows_affected() == 1)
    }
}
