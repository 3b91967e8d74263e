//! Business logic services.
//!
//! The validation and classification core lives here, separated from HTTP
//! handlers and storage. Everything except `gateway_client` and
//! `transaction_service` is free of I/O.

pub mod classifier;
pub mod gateway_client;
pub mod preflight;
pub mod reference;
pub mod transaction_service;
pub mod validator;
