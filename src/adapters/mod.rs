//! Adapters - implementations of the ports against real infrastructure.

pub mod http;
pub mod memory;
pub mod paystack;
pub mod postgres;
pub mod redis;
pub mod whatsapp;
