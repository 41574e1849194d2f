//! Repository for the event log (`events` joined to `event_types`).

use cinema_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{Event, EventType, NewEvent};

const SELECT_EVENTS: &str = "SELECT e.id, t.name AS event_type, e.subject_type, e.subject_id, \
                                    e.actor_id, e.payload, e.occurred_at, e.recorded_at \
                             FROM events e JOIN event_types t ON t.id = e.event_type_id";

pub struct EventRepo;

impl EventRepo {
    /// Append an event. Returns `None` without writing when `event_type`
    /// has no row in `event_types`.
    pub async fn record(pool: &PgPool, event: &NewEvent<'_>) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events
                 (event_type_id, subject_type, subject_id, actor_id, payload, occurred_at)
             SELECT t.id, $2, $3, $4, $5, $6 FROM event_types t WHERE t.name = $1
             RETURNING id",
        )
        .bind(event.event_type)
        .bind(event.subject_type)
        .bind(event.subject_id)
        .bind(event.actor_id)
        .bind(event.payload)
        .bind(event.occurred_at)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_event_types(pool: &PgPool) -> Result<Vec<EventType>, sqlx::Error> {
        sqlx::query_as::<_, EventType>(
            "SELECT id, name, description FROM event_types ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    /// History of one entity, in the order it happened.
    pub async fn list_for_subject(
        pool: &PgPool,
        subject_type: &str,
        subject_id: DbId,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let sql = format!(
            "{SELECT_EVENTS}
             WHERE e.subject_type = $1 AND e.subject_id = $2
             ORDER BY e.occurred_at, e.id"
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(subject_type)
            .bind(subject_id)
            .fetch_all(pool)
            .await
    }

    /// Newest first, optionally narrowed to one event type.
    pub async fn list_recent(
        pool: &PgPool,
        event_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let sql = format!(
            "{SELECT_EVENTS}
             WHERE ($1::TEXT IS NULL OR t.name = $1)
             ORDER BY e.occurred_at DESC, e.id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(event_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
