//! Paystack adapters: the REST gateway and a mock for tests.

mod gateway;
mod mock;

pub use gateway::{PaystackConfig, PaystackGateway};
pub use mock::MockPaymentGateway;
