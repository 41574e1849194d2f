//! In-memory payment provider.
//!
//! Used when `STRIPE_SECRET_KEY` is not configured and in tests. Intents are
//! created already `succeeded`, as if the customer confirmed them instantly.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CreateIntent, PaymentError, PaymentIntent, PaymentProvider, PaymentStatus};

/// Mock [`PaymentProvider`] keeping intents in a map.
pub struct MockPaymentProvider {
    intents: RwLock<HashMap<String, PaymentIntent>>,
    initial_status: PaymentStatus,
    decline_all: bool,
}

impl MockPaymentProvider {
    /// Provider whose intents succeed immediately.
    pub fn new() -> Self {
        Self {
            intents: RwLock::new(HashMap::new()),
            initial_status: PaymentStatus::Succeeded,
            decline_all: false,
        }
    }

    /// Provider whose intents stay at `status` until [`set_status`](Self::set_status).
    pub fn with_initial_status(status: PaymentStatus) -> Self {
        Self {
            initial_status: status,
            ..Self::new()
        }
    }

    /// Provider that declines every intent.
    pub fn declining() -> Self {
        Self {
            decline_all: true,
            ..Self::new()
        }
    }

    /// Overwrite the status of a stored intent. Returns `false` if unknown.
    pub async fn set_status(&self, id: &str, status: PaymentStatus) -> bool {
        match self.intents.write().await.get_mut(id) {
            Some(intent) => {
                intent.status = status;
                true
            }
            None => false,
        }
    }
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_intent(&self, input: &CreateIntent) -> Result<PaymentIntent, PaymentError> {
        if self.decline_all {
            return Err(PaymentError::Declined("Mock provider declines all payments".into()));
        }

        let id = format!("pi_mock_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret_{}", Uuid::new_v4().simple())),
            id: id.clone(),
            amount_cents: input.amount_cents,
            currency: input.currency.clone(),
            status: self.initial_status,
            metadata: input.metadata.clone(),
        };
        self.intents.write().await.insert(id, intent.clone());
        tracing::debug!(payment_intent_id = %intent.id, "Mock payment intent created");
        Ok(intent)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.intents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use assert_matches::assert_matches;

    fn input() -> CreateIntent {
        CreateIntent {
            amount_cents: 1800,
            currency: "eur".into(),
            metadata: BTreeMap::from([("session_id".to_string(), "5".to_string())]),
        }
    }

    #[tokio::test]
    async fn created_intents_succeed_and_can_be_retrieved() {
        let provider = MockPaymentProvider::new();
        let created = provider.create_intent(&input()).await.unwrap();
        assert_eq!(created.status, PaymentStatus::Succeeded);
        assert!(created.id.starts_with("pi_mock_"));
        assert!(created.client_secret.is_some());

        let fetched = provider.retrieve_intent(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.metadata["session_id"], "5");
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found() {
        let provider = MockPaymentProvider::new();
        assert_matches!(
            provider.retrieve_intent("pi_missing").await,
            Err(PaymentError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn status_can_be_advanced() {
        let provider = MockPaymentProvider::with_initial_status(PaymentStatus::RequiresPaymentMethod);
        let created = provider.create_intent(&input()).await.unwrap();
        assert_eq!(created.status, PaymentStatus::RequiresPaymentMethod);

        assert!(provider.set_status(&created.id, PaymentStatus::Succeeded).await);
        let fetched = provider.retrieve_intent(&created.id).await.unwrap();
        assert_eq!(fetched.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn declining_provider_rejects() {
        let provider = MockPaymentProvider::declining();
        assert_matches!(
            provider.create_intent(&input()).await,
            Err(PaymentError::Declined(_))
        );
    }
}
