//! Appends every bus event to the `events` table.

use cinema_core::types::DbId;
use cinema_db::models::event::NewEvent;
use cinema_db::repositories::EventRepo;
use cinema_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::consume;
use crate::event::DomainEvent;

pub struct EventRecorder;

impl EventRecorder {
    /// Record events until the bus is dropped. Write failures are logged and
    /// the event is skipped.
    pub async fn run(pool: DbPool, receiver: broadcast::Receiver<DomainEvent>) {
        consume("event-recorder", receiver, |event| {
            let pool = pool.clone();
            async move {
                match Self::record(&pool, &event).await {
                    Ok(Some(id)) => {
                        tracing::debug!(event_id = id, kind = %event.kind, "Event recorded");
                    }
                    Ok(None) => {
                        tracing::warn!(kind = %event.kind, "Event type not seeded, event dropped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, kind = %event.kind, "Failed to record event");
                    }
                }
            }
        })
        .await;
    }

    /// Returns `None` when the kind has no `event_types` row.
    pub async fn record(pool: &DbPool, event: &DomainEvent) -> Result<Option<DbId>, sqlx::Error> {
        EventRepo::record(
            pool,
            &NewEvent {
                event_type: event.kind.as_str(),
                subject_type: event.subject_type(),
                subject_id: event.subject_id,
                actor_id: event.actor_id,
                payload: &event.payload,
                occurred_at: event.occurred_at,
            },
        )
        .await
    }
}
