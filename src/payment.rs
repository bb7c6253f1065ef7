//! Hand-off of priced order lines to the external payment provider.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::PaymentConfig;

/// One line as the payment provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentLineItem {
    pub id: Uuid,
    pub title: String,
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("cannot submit an order without items")]
    EmptyOrder,

    #[error("payment provider rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("payment provider returned no redirect url")]
    MissingRedirect,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PaymentError {
    /// Status code the provider answered with, if it got that far.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            PaymentError::Rejected { status, .. } => Some(*status),
            PaymentError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit the lines for payment and return the URL the payer is sent to.
    async fn submit(&self, items: Vec<PaymentLineItem>) -> Result<String, PaymentError>;
}

/// JSON-over-HTTP payment provider client.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    config: PaymentConfig,
    http: Client,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    items: &'a [PaymentLineItem],
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    redirect_url: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(config: PaymentConfig) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn submit(&self, items: Vec<PaymentLineItem>) -> Result<String, PaymentError> {
        if items.is_empty() {
            return Err(PaymentError::EmptyOrder);
        }
        let url = self
            .config
            .api_url
            .as_deref()
            .ok_or(PaymentError::NotConfigured)?;

        tracing::debug!(lines = items.len(), "submitting order to payment provider");

        let mut request = self.http.post(url).json(&SubmitRequest { items: &items });
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: SubmitResponse = response.json().await?;
        parsed
            .redirect_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(PaymentError::MissingRedirect)
    }
}
