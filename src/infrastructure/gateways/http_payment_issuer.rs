//! # HTTP Payment Issuer
//!
//! [`PaymentIssuer`] adapter for a JSON payout API.
//!
//! ```text
//! POST {base_url}/v1/payouts
//! Idempotency-Key: payout_<uuid hex>
//! Authorization: Bearer <api key>      (optional)
//!
//! { "destination": "acct_1", "amount_minor": 72200, "currency": "usd" }
//! → 200 { "id": "po_123" }
//! ```
//!
//! The processor is expected to return the original payout when it sees a
//! repeated idempotency key. Amounts travel in minor units.

use crate::domain::value_objects::ExternalPayoutId;
use crate::infrastructure::gateways::error::{GatewayError, GatewayResult};
use crate::infrastructure::gateways::http_client::HttpClient;
use crate::infrastructure::gateways::traits::{PaymentIssuer, PayoutInstruction};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

const IDEMPOTENCY_KEY: HeaderName = HeaderName::from_static("idempotency-key");

#[derive(Debug, Serialize)]
struct CreatePayoutRequest<'a> {
    destination: &'a str,
    amount_minor: u64,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePayoutResponse {
    id: String,
}

/// Payment issuer backed by an HTTP payout API.
#[derive(Debug, Clone)]
pub struct HttpPaymentIssuer {
    client: HttpClient,
    payouts_url: String,
}

impl HttpPaymentIssuer {
    /// Creates an issuer for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the API key is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout_ms: u64) -> GatewayResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| GatewayError::internal(format!("invalid API key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(Self {
            client: HttpClient::with_headers(timeout_ms, headers)?,
            payouts_url: format!("{}/v1/payouts", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PaymentIssuer for HttpPaymentIssuer {
    async fn issue_payout(
        &self,
        instruction: &PayoutInstruction,
    ) -> GatewayResult<ExternalPayoutId> {
        let amount_minor = instruction
            .amount
            .to_minor_units()
            .map_err(|e| GatewayError::invalid_request(format!("amount not representable: {e}")))?;
        let body = CreatePayoutRequest {
            destination: &instruction.destination,
            amount_minor,
            currency: &instruction.currency,
        };

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&instruction.idempotency_key)
            .map_err(|e| GatewayError::invalid_request(format!("invalid idempotency key: {e}")))?;
        headers.insert(IDEMPOTENCY_KEY, key);

        debug!(
            idempotency_key = %instruction.idempotency_key,
            amount_minor,
            "Requesting payout"
        );
        let response: CreatePayoutResponse = self
            .client
            .post_with_headers(&self.payouts_url, &body, headers)
            .await?;
        Ok(ExternalPayoutId::new(response.id))
    }
}
