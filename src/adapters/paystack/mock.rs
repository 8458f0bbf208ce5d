//! Mock payment gateway for tests and offline development.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{GatewayError, InitializeTransaction, PaymentGateway, TransactionHandle};

/// Gateway that fabricates payment links locally.
pub struct MockPaymentGateway {
    fail: bool,
    counter: AtomicU32,
    disabled: Mutex<Vec<String>>,
}

impl MockPaymentGateway {
    /// Working mock; every call succeeds with a synthetic handle.
    pub fn new() -> Self {
        Self {
            fail: false,
            counter: AtomicU32::new(0),
            disabled: Mutex::new(Vec::new()),
        }
    }

    /// Mock where every call fails with a transport error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            counter: AtomicU32::new(0),
            disabled: Mutex::new(Vec::new()),
        }
    }

    /// Subscription codes passed to `disable_subscription`, in call order.
    pub fn disabled_codes(&self) -> Vec<String> {
        self.disabled.lock().unwrap().clone()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn initialize_transaction(
        &self,
        _request: InitializeTransaction,
    ) -> Result<TransactionHandle, GatewayError> {
        if self.fail {
            return Err(GatewayError::Http("connection refused".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionHandle {
            authorization_url: format!("https://checkout.paystack.com/mock_{}", n),
            access_code: format!("ac_mock_{}", n),
            reference: format!("ref_mock_{}", n),
        })
    }

    async fn disable_subscription(&self, subscription_code: &str) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Http("connection refused".to_string()));
        }
        self.disabled
            .lock()
            .unwrap()
            .push(subscription_code.to_string());
        Ok(())
    }
}
