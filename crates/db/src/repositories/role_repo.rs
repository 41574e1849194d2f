//! Repository for the seeded `roles` table.
//!
//! Roles are created by migrations only; the API never writes them.

use std::collections::HashMap;

use cinema_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::Role;

const COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct RoleRepo;

impl RoleRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up one of the well-known roles (`cinema_core::roles`).
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Role names keyed by id, for rendering user lists in one query.
    pub async fn names_by_id(pool: &PgPool) -> Result<HashMap<DbId, String>, sqlx::Error> {
        let rows: Vec<(DbId, String)> = sqlx::query_as("SELECT id, name FROM roles")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Name of the role a user holds.
    ///
    /// `users.role_id` is a foreign key, so a missing row surfaces as
    /// `RowNotFound`.
    pub async fn resolve_name(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_one(pool)
            .await
    }
}
