//! Rows of the event log.

use cinema_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventType {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
}

/// A logged event, with its type resolved to the dotted name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub event_type: String,
    pub subject_type: String,
    pub subject_id: DbId,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
    pub recorded_at: Timestamp,
}

/// Insert payload for [`crate::repositories::EventRepo::record`].
#[derive(Debug)]
pub struct NewEvent<'a> {
    pub event_type: &'a str,
    pub subject_type: &'a str,
    pub subject_id: DbId,
    pub actor_id: Option<DbId>,
    pub payload: &'a serde_json::Value,
    pub occurred_at: Timestamp,
}
