//! PayPal REST client (OAuth2 client credentials + Orders v2).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::Money;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::{IntentDetails, PaymentIntent, PaymentProvider, is_valid_intent_id};

/// Sandbox endpoint used when no base URL is configured.
pub const SANDBOX_API: &str = "https://api-m.sandbox.paypal.com";

const CURRENCY: &str = "USD";

/// Connection settings for [`PayPalClient`].
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub api_base: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout: Duration,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            api_base: SANDBOX_API.to_string(),
            client_id: None,
            client_secret: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl PayPalConfig {
    fn credentials(&self) -> Result<(&str, &str), ProviderError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
            _ => Err(ProviderError::MissingCredentials),
        }
    }
}

/// PayPal Orders v2 client.
///
/// An access token is requested for every operation; nothing is cached.
#[derive(Debug, Clone)]
pub struct PayPalClient {
    http: reqwest::Client,
    config: PayPalConfig,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let (client_id, client_secret) = self.config.credentials()?;
        let request = self
            .http
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(client_id, Some(client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials");

        let token: TokenResponse = self.execute("token", request).await?;
        Ok(token.access_token)
    }

    /// Sends a request, recording latency and failures per operation.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let start = Instant::now();
        let result = send(request).await;

        metrics::histogram!("payment_provider_duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics::counter!("payment_provider_errors_total", "operation" => operation)
                .increment(1);
            tracing::error!(operation, error = %err, "payment provider call failed");
        }

        result
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(err)
    }
}

#[async_trait]
impl PaymentProvider for PayPalClient {
    #[tracing::instrument(skip(self), fields(amount = %amount))]
    async fn create_intent(&self, amount: Money) -> Result<PaymentIntent, ProviderError> {
        let token = self.access_token().await?;
        let body = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitRequest {
                amount: AmountBody {
                    currency_code: CURRENCY.to_string(),
                    value: amount.to_decimal_string(),
                },
            }],
        };
        let request = self
            .http
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .json(&body);

        let order: OrderResponse = self.execute("create_order", request).await?;
        tracing::info!(intent_id = %order.id, status = %order.status, "payment intent created");

        Ok(PaymentIntent {
            id: order.id,
            status: order.status,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError> {
        check_intent_id(intent_id)?;
        let token = self.access_token().await?;
        let request = self
            .http
            .get(self.url(&format!("/v2/checkout/orders/{intent_id}")))
            .bearer_auth(token);

        match self.execute::<OrderResponse>("get_order", request).await {
            Err(ProviderError::Status { status: 404, .. }) => {
                Err(ProviderError::UnknownIntent(intent_id.to_string()))
            }
            result => result?.into_details(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn capture_intent(&self, intent_id: &str) -> Result<IntentDetails, ProviderError> {
        check_intent_id(intent_id)?;
        let token = self.access_token().await?;
        let request = self
            .http
            .post(self.url(&format!("/v2/checkout/orders/{intent_id}/capture")))
            .bearer_auth(token)
            .json(&serde_json::json!({}));

        let order: OrderResponse = self.execute("capture_order", request).await?;
        tracing::info!(intent_id, status = %order.status, "payment intent captured");
        order.into_details()
    }
}

/// Rejects ids that would change the request path before any token is sent.
fn check_intent_id(intent_id: &str) -> Result<(), ProviderError> {
    if is_valid_intent_id(intent_id) {
        Ok(())
    } else {
        Err(ProviderError::UnknownIntent(intent_id.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnitRequest>,
}

#[derive(Debug, Serialize)]
struct PurchaseUnitRequest {
    amount: AmountBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct AmountBody {
    #[serde(default)]
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
    #[serde(default)]
    payer: Option<Payer>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    #[serde(default)]
    amount: Option<AmountBody>,
    #[serde(default)]
    payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    #[serde(default)]
    amount: Option<AmountBody>,
}

#[derive(Debug, Deserialize)]
struct Payer {
    #[serde(default)]
    email_address: Option<String>,
}

impl OrderResponse {
    fn into_details(self) -> Result<IntentDetails, ProviderError> {
        // Capture responses may carry the amount only on the capture itself.
        let amount = self.purchase_units.first().and_then(|unit| {
            unit.amount.as_ref().or_else(|| {
                unit.payments
                    .as_ref()
                    .and_then(|p| p.captures.first())
                    .and_then(|c| c.amount.as_ref())
            })
        });
        let amount = amount
            .map(|a| {
                Money::parse_decimal(&a.value)
                    .ok_or_else(|| ProviderError::Malformed(format!("amount {:?}", a.value)))
            })
            .transpose()?;

        Ok(IntentDetails {
            id: self.id,
            status: self.status,
            payer_email: self.payer.and_then(|p| p.email_address),
            amount,
        })
    }
}
