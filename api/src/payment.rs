//! Payment gateway seam.
//!
//! The booking flow only needs two things from the gateway: a checkout
//! URL to send the guest to, and a server-side confirm call. `TossClient`
//! is the production implementation; tests substitute a mock behind the
//! same trait.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Approval {
    pub payment_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The gateway processed the request and rejected the charge.
    #[error("payment declined: {code}: {message}")]
    Declined { code: String, message: String },
    /// The gateway was unreachable or answered with something we could
    /// not interpret. The charge state is unknown; fail closed.
    #[error("payment gateway error")]
    Gateway(#[source] anyhow::Error),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Where to send the guest to complete checkout for `order_id`.
    fn checkout_url(&self, order_id: &str, amount: i64) -> String;

    /// Server-side capture of an authorized payment.
    async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: i64,
    ) -> Result<Approval, PaymentError>;
}

/// Toss Payments client.
pub struct TossClient {
    http_client: reqwest::Client,
    base_url: String,
    checkout_url: String,
    secret_key: SecretString,
}

#[derive(Deserialize)]
struct TossConfirmBody {
    #[serde(rename = "paymentKey")]
    payment_key: String,
}

#[derive(Deserialize)]
struct TossErrorBody {
    code: String,
    message: String,
}

impl TossClient {
    pub fn new(
        base_url: String,
        checkout_url: String,
        secret_key: SecretString,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            checkout_url,
            secret_key,
        }
    }

    /// Toss basic auth: base64 of the secret key followed by a colon.
    fn authorization(&self) -> String {
        format!(
            "Basic {}",
            BASE64.encode(format!("{}:", self.secret_key.expose_secret()))
        )
    }
}

#[async_trait]
impl PaymentGateway for TossClient {
    fn checkout_url(&self, order_id: &str, amount: i64) -> String {
        format!("{}?orderId={order_id}&amount={amount}", self.checkout_url)
    }

    async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: i64,
    ) -> Result<Approval, PaymentError> {
        let response = self
            .http_client
            .post(format!("{}/v1/payments/confirm", self.base_url))
            .header("Authorization", self.authorization())
            .json(&serde_json::json!({
                "paymentKey": payment_key,
                "orderId": order_id,
                "amount": amount,
            }))
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.into()))?;

        let status = response.status();
        if status.is_success() {
            let body: TossConfirmBody = response
                .json()
                .await
                .map_err(|e| PaymentError::Gateway(e.into()))?;
            return Ok(Approval {
                payment_key: body.payment_key,
            });
        }
        match response.json::<TossErrorBody>().await {
            Ok(body) => Err(PaymentError::Declined {
                code: body.code,
                message: body.message,
            }),
            Err(e) => Err(PaymentError::Gateway(anyhow::anyhow!(
                "gateway answered {status} with an unreadable body: {e}"
            ))),
        }
    }
}
