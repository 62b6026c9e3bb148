use std::time::Duration;

use anyhow::Result;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::error;

use crate::domain::value_objects::payments::{CheckoutRequest, GatewaySession, GatewaySessionState};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Minimal Stripe Checkout client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    currency: String,
    product_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    pub payment_status: Option<String>,
    /// `open`, `complete` or `expired`.
    pub status: Option<String>,
    pub amount_total: Option<i64>,
}

impl StripeCheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    pub fn state(&self) -> GatewaySessionState {
        if self.is_paid() {
            GatewaySessionState::Paid
        } else if self.status.as_deref() == Some("expired") {
            GatewaySessionState::Expired
        } else {
            GatewaySessionState::Open
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

impl StripeClient {
    /// Every request is bounded by `timeout`.
    pub fn new(
        secret_key: String,
        currency: String,
        product_name: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            secret_key,
            currency,
            product_name,
        })
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .or_else(|| resp.headers().get("stripe-request-id"))
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (stripe_error_type, stripe_error_code, stripe_error_param, stripe_error_message) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (details.type_, details.code, details.param, details.message)
                }
                Err(_) => (None, None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?stripe_error_type,
            stripe_error_code = ?stripe_error_code,
            stripe_error_param = ?stripe_error_param,
            stripe_error_message = ?stripe_error_message,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// Form body for a one-off `payment` mode session priced inline, so no
    /// Stripe Price object has to exist per field.
    pub fn checkout_form(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        vec![
            ("mode".to_string(), "payment".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                self.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                self.product_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                request.description.clone(),
            ),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "client_reference_id".to_string(),
                request.booking_id.to_string(),
            ),
            (
                "metadata[payment_id]".to_string(),
                request.payment_id.to_string(),
            ),
            (
                "metadata[booking_id]".to_string(),
                request.booking_id.to_string(),
            ),
        ]
    }

    /// Creates a Checkout Session. A retried request with the same
    /// idempotency key cannot open a second session.
    pub async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<GatewaySession> {
        // https://stripe.com/docs/api/checkout/sessions/create
        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&self.checkout_form(request))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        let session: StripeCheckoutSession = resp.json().await?;
        let url = session
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))?;

        Ok(GatewaySession {
            id: session.id,
            url,
        })
    }

    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<StripeCheckoutSession> {
        // https://stripe.com/docs/api/checkout/sessions/retrieve
        let resp = self
            .http
            .get(format!("{STRIPE_API_BASE}/checkout/sessions/{session_id}"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve checkout session").await?;

        let session: StripeCheckoutSession = resp.json().await?;
        Ok(session)
    }

    /// Expires an open session so it can no longer be paid.
    pub async fn expire_checkout_session(&self, session_id: &str) -> Result<()> {
        // https://stripe.com/docs/api/checkout/sessions/expire
        let resp = self
            .http
            .post(format!(
                "{STRIPE_API_BASE}/checkout/sessions/{session_id}/expire"
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        Self::ensure_success(resp, "expire checkout session").await?;

        Ok(())
    }
}
