//! Card payment submission service.
//!
//! Validates card-payment input, submits it to a payment gateway once, and
//! classifies the gateway's answer into an auditable transaction record.
//!
//! # Layout
//!
//! - `services::validator` / `services::preflight`: checks run before any network call
//! - `services::gateway_client`: the single HTTP round trip
//! - `services::classifier`: gateway outcome to terminal status
//! - `services::transaction_service`: the submission flow
//! - `store`: record persistence (in-memory or PostgreSQL)
//! - `handlers`: the axum HTTP API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
