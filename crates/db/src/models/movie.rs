//! Movie entity model and DTOs.

use chrono::NaiveDate;
use cinema_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::category::Category;

/// A movie row from the `movies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Movie {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub director: Option<String>,
    pub duration_minutes: i32,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub age_rating: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A movie enriched with the categories it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct MovieWithCategories {
    #[serde(flatten)]
    pub movie: Movie,
    pub categories: Vec<Category>,
}

/// DTO for creating a new movie.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMovie {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub director: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: i32,
    pub release_date: Option<NaiveDate>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[validate(url)]
    pub trailer_url: Option<String>,
    #[validate(length(max = 16))]
    pub age_rating: Option<String>,
    /// Categories to link the movie to.
    #[serde(default)]
    pub category_ids: Vec<DbId>,
}

/// DTO for updating an existing movie. All fields are optional.
///
/// When `category_ids` is present it replaces the movie's category set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMovie {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub director: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
    pub release_date: Option<NaiveDate>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[validate(url)]
    pub trailer_url: Option<String>,
    #[validate(length(max = 16))]
    pub age_rating: Option<String>,
    pub is_active: Option<bool>,
    pub category_ids: Option<Vec<DbId>>,
}

/// Filters for listing movies.
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub category_id: Option<DbId>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub include_inactive: bool,
    pub limit: i64,
    pub offset: i64,
}
