//! Payment provider abstraction.
//!
//! Checkout follows the PaymentIntent flow: the server creates an intent for
//! the priced seat selection, the client confirms it with the provider, and
//! the booking endpoint retrieves the intent again to verify it succeeded
//! before recording the booking.
//!
//! - [`stripe::StripeProvider`]: Stripe REST API over `reqwest`.
//! - [`mock::MockPaymentProvider`]: in-memory provider for development and tests.

pub mod mock;
pub mod stripe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use cinema_core::types::Cents;
use serde::{Deserialize, Serialize};

pub use mock::MockPaymentProvider;
pub use stripe::{StripeConfig, StripeProvider};

/// Metadata keys attached to every intent so a booking can be matched
/// against the selection that was priced.
pub const META_USER_ID: &str = "user_id";
pub const META_SESSION_ID: &str = "session_id";
pub const META_SEAT_IDS: &str = "seat_ids";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle state of a payment intent, using Stripe's status names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentStatus::RequiresAction => "requires_action",
            PaymentStatus::Processing => "processing",
            PaymentStatus::RequiresCapture => "requires_capture",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

/// A payment intent as seen by the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Secret the client uses to confirm the intent.
    pub client_secret: Option<String>,
    pub amount_cents: Cents,
    /// Lowercase ISO 4217 code.
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(skip)]
    pub metadata: BTreeMap<String, String>,
}

/// Parameters for creating an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    pub amount_cents: Cents,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors returned by payment providers.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The provider refused the payment (card declined, invalid amount, ...).
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The intent exists but has not reached `succeeded`.
    #[error("Payment not completed (status: {})", .0.as_str())]
    NotCompleted(PaymentStatus),

    #[error("Payment intent not found: {0}")]
    NotFound(String),

    /// The provider answered with an unexpected error.
    #[error("Payment provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider could not be reached or returned an unreadable body.
    #[error("Payment provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A payment service able to create and look up payment intents.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Short name for logs, e.g. `"stripe"`.
    fn name(&self) -> &'static str;

    async fn create_intent(&self, input: &CreateIntent) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}
