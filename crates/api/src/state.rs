use std::sync::Arc;

use crate::config::ServerConfig;
use crate::payments::PaymentProvider;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cinema_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Event bus for booking, session and account events.
    pub event_bus: Arc<cinema_events::EventBus>,
    /// Payment provider (Stripe in production, in-memory mock otherwise).
    pub payments: Arc<dyn PaymentProvider>,
}
