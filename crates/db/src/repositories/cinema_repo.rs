//! Repository for the `cinemas` table.

use cinema_core::types::DbId;
use sqlx::PgPool;

use crate::models::cinema::{Cinema, CreateCinema, UpdateCinema};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, address, city, phone, created_at, updated_at";

/// Provides CRUD operations for cinemas.
pub struct CinemaRepo;

impl CinemaRepo {
    /// Insert a new cinema, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCinema) -> Result<Cinema, sqlx::Error> {
        let query = format!(
            "INSERT INTO cinemas (name, address, city, phone)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    /// Find a cinema by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Cinema>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cinemas WHERE id = $1");
        sqlx::query_as::<_, Cinema>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List cinemas, optionally restricted to one city (case-insensitive).
    pub async fn list(pool: &PgPool, city: Option<&str>) -> Result<Vec<Cinema>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cinemas
             WHERE ($1::TEXT IS NULL OR LOWER(city) = LOWER($1))
             ORDER BY city ASC, name ASC"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(city)
            .fetch_all(pool)
            .await
    }

    /// Update a cinema. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCinema,
    ) -> Result<Option<Cinema>, sqlx::Error> {
        let query = format!(
            "UPDATE cinemas SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                phone = COALESCE($5, phone)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.city)
            .bind(&input.phone)
            .fetch_optional(pool)
            .await
    }

    /// Delete a cinema and (by cascade) its rooms and seats.
    ///
    /// Fails with a foreign key violation while any session still uses one of
    /// its rooms. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cinemas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
