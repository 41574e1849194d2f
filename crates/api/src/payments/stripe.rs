//! Stripe PaymentIntents over the REST API.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token, as documented for `POST /v1/payment_intents`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cinema_core::types::Cents;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{CreateIntent, PaymentError, PaymentIntent, PaymentProvider, PaymentStatus};

/// Default Stripe API base URL.
const DEFAULT_API_BASE: &str = "https://api.stripe.com";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Stripe credentials.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// API base URL without trailing slash (overridable for stubs).
    pub api_base: String,
}

impl StripeConfig {
    /// Load from the environment.
    ///
    /// | Variable            | Required | Default                  |
    /// |---------------------|----------|--------------------------|
    /// | `STRIPE_SECRET_KEY` | yes      |                          |
    /// | `STRIPE_API_BASE`   | no       | `https://api.stripe.com` |
    ///
    /// Returns `None` when `STRIPE_SECRET_KEY` is unset or empty.
    pub fn from_env() -> Option<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|k| !k.is_empty())?;
        let api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Some(Self {
            secret_key,
            api_base,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
    amount: Cents,
    currency: String,
    status: PaymentStatus,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl From<StripeIntent> for PaymentIntent {
    fn from(s: StripeIntent) -> Self {
        PaymentIntent {
            id: s.id,
            client_secret: s.client_secret,
            amount_cents: s.amount,
            currency: s.currency,
            status: s.status,
            metadata: s.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Form fields for creating an intent.
pub fn intent_form(input: &CreateIntent) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), input.amount_cents.to_string()),
        ("currency".to_string(), input.currency.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    form.extend(
        input
            .metadata
            .iter()
            .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
    );
    form
}

/// Map a non-2xx Stripe response to a [`PaymentError`].
pub fn classify_error(status: StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<StripeErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));
    let kind = detail.as_ref().and_then(|d| d.kind.as_deref());

    match (status, kind) {
        (StatusCode::PAYMENT_REQUIRED, _) | (_, Some("card_error")) => {
            PaymentError::Declined(message)
        }
        (StatusCode::NOT_FOUND, _) => PaymentError::NotFound(message),
        (StatusCode::BAD_REQUEST, Some("invalid_request_error")) => {
            PaymentError::Declined(message)
        }
        _ => PaymentError::Provider {
            status: status.as_u16(),
            message,
        },
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Stripe-backed [`PaymentProvider`].
pub struct StripeProvider {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn read_intent(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }
        let intent: StripeIntent = response.json().await?;
        Ok(intent.into())
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_intent(&self, input: &CreateIntent) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .form(&intent_form(input))
            .send()
            .await?;
        let intent = Self::read_intent(response).await?;
        tracing::info!(
            payment_intent_id = %intent.id,
            amount_cents = intent.amount_cents,
            "Stripe payment intent created"
        );
        Ok(intent)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .get(format!("{}/v1/payment_intents/{id}", self.config.api_base))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;
        Self::read_intent(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn form_includes_amount_currency_and_metadata() {
        let input = CreateIntent {
            amount_cents: 2500,
            currency: "usd".into(),
            metadata: BTreeMap::from([
                ("seat_ids".to_string(), "3,4".to_string()),
                ("session_id".to_string(), "9".to_string()),
            ]),
        };
        let form = intent_form(&input);
        assert!(form.contains(&("amount".into(), "2500".into())));
        assert!(form.contains(&("currency".into(), "usd".into())));
        assert!(form.contains(&("metadata[seat_ids]".into(), "3,4".into())));
        assert!(form.contains(&("metadata[session_id]".into(), "9".into())));
    }

    #[test]
    fn stripe_intent_json_maps_to_payment_intent() {
        let raw = r#"{
            "id": "pi_123",
            "object": "payment_intent",
            "client_secret": "pi_123_secret_abc",
            "amount": 2500,
            "currency": "usd",
            "status": "requires_payment_method",
            "metadata": {"session_id": "9"}
        }"#;
        let intent: PaymentIntent = serde_json::from_str::<StripeIntent>(raw).unwrap().into();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.amount_cents, 2500);
        assert_eq!(intent.status, PaymentStatus::RequiresPaymentMethod);
        assert_eq!(intent.metadata["session_id"], "9");
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let raw = r#"{"id":"pi_1","amount":1,"currency":"usd","status":"brand_new_state"}"#;
        let intent = serde_json::from_str::<StripeIntent>(raw).unwrap();
        assert_eq!(intent.status, PaymentStatus::Unknown);
    }

    #[test]
    fn card_errors_are_declines() {
        let body = r#"{"error":{"type":"card_error","message":"Your card was declined."}}"#;
        assert_matches!(
            classify_error(StatusCode::PAYMENT_REQUIRED, body),
            PaymentError::Declined(msg) if msg == "Your card was declined."
        );
    }

    #[test]
    fn missing_intent_is_not_found() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"No such payment_intent"}}"#;
        assert_matches!(
            classify_error(StatusCode::NOT_FOUND, body),
            PaymentError::NotFound(_)
        );
    }

    #[test]
    fn server_errors_are_provider_errors() {
        assert_matches!(
            classify_error(StatusCode::BAD_GATEWAY, "<html>"),
            PaymentError::Provider { status: 502, .. }
        );
    }
}
