//! Repository for the `users` table.
//!
//! Emails are always compared and stored lowercased, so `Alice@Example.com`
//! and `alice@example.com` are the same account.

use cinema_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role_id, is_active, \
                            last_login_at, failed_login_count, locked_until, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, role_id)
             VALUES ($1, $2, LOWER($3), $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)");
        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Newest accounts first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Patch a user; `None` fields keep their stored value.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        patch: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE(LOWER($4), email),
                role_id    = COALESCE($5, role_id),
                is_active  = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(patch.first_name.as_deref())
            .bind(patch.last_name.as_deref())
            .bind(patch.email.as_deref())
            .bind(patch.role_id)
            .bind(patch.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Returns `false` when the user does not exist or is already inactive.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }

    /// Count one failed password attempt and lock the account until
    /// `lock_until` once `max_attempts` consecutive failures are reached.
    ///
    /// An expired lock restarts the count at one. Runs as a single statement
    /// so concurrent attempts cannot lose increments. Returns `true` when the
    /// account is locked afterwards; `false` also for an unknown `id`.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        max_attempts: i32,
        lock_until: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let locked: Option<bool> = sqlx::query_scalar(
            "WITH attempt AS (
                 SELECT CASE WHEN locked_until <= NOW() THEN 1
                             ELSE failed_login_count + 1
                        END AS count
                 FROM users WHERE id = $1
                 FOR UPDATE
             )
             UPDATE users u SET
                 failed_login_count = a.count,
                 locked_until = CASE WHEN a.count >= $2 THEN $3 ELSE u.locked_until END
             FROM attempt a
             WHERE u.id = $1
             RETURNING COALESCE(u.locked_until > NOW(), FALSE)",
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lock_until)
        .fetch_optional(pool)
        .await?;
        Ok(locked.unwrap_or(false))
    }

    /// Clear the failure counter and any lock, and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET failed_login_count = 0, locked_until = NULL, last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await
        .map(|_| ())
    }

    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }
}
