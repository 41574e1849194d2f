//! Repository for the `movies` and `movie_categories` tables.

use std::collections::HashMap;

use cinema_core::types::{DbId, Timestamp};
use sqlx::{FromRow, PgPool};

use crate::models::category::Category;
use crate::models::movie::{CreateMovie, Movie, MovieFilter, MovieWithCategories, UpdateMovie};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, director, duration_minutes, release_date, \
                        poster_url, trailer_url, age_rating, is_active, created_at, updated_at";

/// Same columns qualified with the `m` alias for JOIN queries.
const M_COLUMNS: &str = "m.id, m.title, m.description, m.director, m.duration_minutes, \
                          m.release_date, m.poster_url, m.trailer_url, m.age_rating, \
                          m.is_active, m.created_at, m.updated_at";

/// A category row tagged with the movie it is linked to.
#[derive(FromRow)]
struct LinkedCategory {
    movie_id: DbId,
    id: DbId,
    name: String,
    description: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

/// Provides CRUD operations for movies and their category links.
pub struct MovieRepo;

impl MovieRepo {
    /// Insert a new movie and its category links in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateMovie) -> Result<Movie, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO movies
                (title, description, director, duration_minutes, release_date,
                 poster_url, trailer_url, age_rating)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.director)
            .bind(input.duration_minutes)
            .bind(input.release_date)
            .bind(&input.poster_url)
            .bind(&input.trailer_url)
            .bind(&input.age_rating)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_categories_inner(&mut tx, movie.id, &input.category_ids).await?;

        tx.commit().await?;
        Ok(movie)
    }

    /// Find a movie by its internal ID (active or not).
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a movie by ID, enriched with its categories.
    pub async fn find_with_categories(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MovieWithCategories>, sqlx::Error> {
        let Some(movie) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let mut categories = Self::categories_for(pool, &[movie.id]).await?;
        Ok(Some(MovieWithCategories {
            categories: categories.remove(&movie.id).unwrap_or_default(),
            movie,
        }))
    }

    /// List movies matching `filter`, each enriched with its categories.
    ///
    /// Results are ordered by release date (newest first, undated last), then title.
    pub async fn list(
        pool: &PgPool,
        filter: &MovieFilter,
    ) -> Result<Vec<MovieWithCategories>, sqlx::Error> {
        let query = format!(
            "SELECT {M_COLUMNS} FROM movies m
             WHERE ($1 OR m.is_active = true)
               AND ($2::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM movie_categories mc
                    WHERE mc.movie_id = m.id AND mc.category_id = $2))
               AND ($3::TEXT IS NULL OR m.title ILIKE $3 ESCAPE '\\')
             ORDER BY m.release_date DESC NULLS LAST, m.title ASC
             LIMIT $4 OFFSET $5"
        );
        let movies = sqlx::query_as::<_, Movie>(&query)
            .bind(filter.include_inactive)
            .bind(filter.category_id)
            .bind(filter.search.as_deref().map(contains_pattern))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = movies.iter().map(|m| m.id).collect();
        let mut categories = Self::categories_for(pool, &ids).await?;

        Ok(movies
            .into_iter()
            .map(|movie| MovieWithCategories {
                categories: categories.remove(&movie.id).unwrap_or_default(),
                movie,
            })
            .collect())
    }

    /// Update a movie. Only non-`None` fields in `input` are applied; a present
    /// `category_ids` replaces the whole category set.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMovie,
    ) -> Result<Option<Movie>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE movies SET
                title = COALESCE(TRIM($2), title),
                description = COALESCE($3, description),
                director = COALESCE($4, director),
                duration_minutes = COALESCE($5, duration_minutes),
                release_date = COALESCE($6, release_date),
                poster_url = COALESCE($7, poster_url),
                trailer_url = COALESCE($8, trailer_url),
                age_rating = COALESCE($9, age_rating),
                is_active = COALESCE($10, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.director)
            .bind(input.duration_minutes)
            .bind(input.release_date)
            .bind(&input.poster_url)
            .bind(&input.trailer_url)
            .bind(&input.age_rating)
            .bind(input.is_active)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(movie) = movie else {
            return Ok(None);
        };

        if let Some(category_ids) = &input.category_ids {
            Self::set_categories_inner(&mut tx, movie.id, category_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(movie))
    }

    /// Permanently delete a movie.
    ///
    /// Fails with a foreign key violation while sessions reference it; callers
    /// should deactivate such movies instead. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Category association helpers
    // -----------------------------------------------------------------------

    /// Load the categories of every movie in `movie_ids`, keyed by movie ID.
    async fn categories_for(
        pool: &PgPool,
        movie_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<Category>>, sqlx::Error> {
        if movie_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, LinkedCategory>(
            "SELECT mc.movie_id, c.id, c.name, c.description, c.created_at, c.updated_at
             FROM movie_categories mc
             JOIN categories c ON c.id = mc.category_id
             WHERE mc.movie_id = ANY($1)
             ORDER BY c.name ASC",
        )
        .bind(movie_ids)
        .fetch_all(pool)
        .await?;

        let mut grouped: HashMap<DbId, Vec<Category>> = HashMap::new();
        for row in rows {
            grouped.entry(row.movie_id).or_default().push(Category {
                id: row.id,
                name: row.name,
                description: row.description,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        Ok(grouped)
    }

    /// Replace all category links of a movie inside an open transaction.
    async fn set_categories_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        movie_id: DbId,
        category_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM movie_categories WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut **tx)
            .await?;

        if category_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO movie_categories (movie_id, category_id)
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT DO NOTHING",
        )
        .bind(movie_id)
        .bind(category_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// `ILIKE` pattern matching `term` anywhere, with its own `%`, `_` and `\`
/// taken literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
