//! Mock payment gateway.
//!
//! Approves every confirm call by default; tests flip it into declining
//! or failing mode to exercise the failure paths. Tracks how many
//! charges were approved so tests can assert that losing a date race
//! never charges twice.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use api::payment::{Approval, PaymentError, PaymentGateway};
use async_trait::async_trait;

enum Mode {
    Approve,
    Decline { code: String, message: String },
    /// Simulates an unreachable gateway or an unreadable response.
    Fail,
}

pub struct MockPaymentGateway {
    mode: Mutex<Mode>,
    approved: AtomicU32,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(Mode::Approve),
            approved: AtomicU32::new(0),
        }
    }

    pub fn approve_all(&self) {
        *self.mode.lock().unwrap() = Mode::Approve;
    }

    pub fn decline_with(&self, code: &str, message: &str) {
        *self.mode.lock().unwrap() = Mode::Decline {
            code: code.to_string(),
            message: message.to_string(),
        };
    }

    pub fn fail_all(&self) {
        *self.mode.lock().unwrap() = Mode::Fail;
    }

    /// Number of confirm calls that were approved (money moved).
    pub fn approved_count(&self) -> u32 {
        self.approved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn checkout_url(&self, order_id: &str, amount: i64) -> String {
        format!(
            "http://payments.test/checkout?orderId={order_id}&amount={amount}"
        )
    }

    async fn confirm(
        &self,
        payment_key: &str,
        _order_id: &str,
        _amount: i64,
    ) -> Result<Approval, PaymentError> {
        let mode = self.mode.lock().unwrap();
        match &*mode {
            Mode::Approve => {
                self.approved.fetch_add(1, Ordering::SeqCst);
                Ok(Approval {
                    payment_key: payment_key.to_string(),
                })
            }
            Mode::Decline { code, message } => Err(PaymentError::Declined {
                code: code.clone(),
                message: message.clone(),
            }),
            Mode::Fail => Err(PaymentError::Gateway(anyhow::anyhow!(
                "gateway unreachable"
            ))),
        }
    }
}
