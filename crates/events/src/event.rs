//! The domain event envelope carried on the [`EventBus`](crate::EventBus).

use chrono::{DateTime, Utc};
use cinema_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Everything the backend announces. Each variant has a seeded row in the
/// `event_types` table under [`EventKind::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "user.registered")]
    UserRegistered,
    #[serde(rename = "booking.confirmed")]
    BookingConfirmed,
    #[serde(rename = "booking.cancelled")]
    BookingCancelled,
    #[serde(rename = "session.created")]
    SessionCreated,
    #[serde(rename = "session.deleted")]
    SessionDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::UserRegistered,
        EventKind::BookingConfirmed,
        EventKind::BookingCancelled,
        EventKind::SessionCreated,
        EventKind::SessionDeleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::UserRegistered => "user.registered",
            EventKind::BookingConfirmed => "booking.confirmed",
            EventKind::BookingCancelled => "booking.cancelled",
            EventKind::SessionCreated => "session.created",
            EventKind::SessionDeleted => "session.deleted",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// The kind of entity events of this kind are about.
    pub fn subject_type(self) -> &'static str {
        match self {
            EventKind::UserRegistered => "user",
            EventKind::BookingConfirmed | EventKind::BookingCancelled => "booking",
            EventKind::SessionCreated | EventKind::SessionDeleted => "session",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to one entity, optionally caused by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub kind: EventKind,
    pub subject_id: DbId,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// An event about the entity `subject_id` of [`EventKind::subject_type`].
    pub fn new(kind: EventKind, subject_id: DbId) -> Self {
        Self {
            kind,
            subject_id,
            actor_id: None,
            payload: serde_json::json!({}),
            occurred_at: Utc::now(),
        }
    }

    pub fn by(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn subject_type(&self) -> &'static str {
        self.kind.subject_type()
    }

    /// Decode the payload into a typed notice.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
