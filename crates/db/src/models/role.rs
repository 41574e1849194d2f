//! Account roles (`admin`, `customer`).

use cinema_core::roles::ROLE_ADMIN;
use cinema_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        self.name == ROLE_ADMIN
    }
}
