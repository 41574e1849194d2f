//! Cinema (venue) model and DTOs.

use cinema_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A cinema row from the `cinemas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cinema {
    pub id: DbId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new cinema.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCinema {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(length(min = 1, max = 200))]
    pub city: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// DTO for updating an existing cinema. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCinema {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub city: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}
