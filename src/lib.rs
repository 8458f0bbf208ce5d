//! Prepbot - WhatsApp exam-practice bot with subscription billing
//!
//! This crate implements a conversational exam-practice bot gated by a paid
//! subscription: ephemeral practice/mock sessions over Redis, durable
//! entitlement over Postgres, and Paystack webhook reconciliation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
