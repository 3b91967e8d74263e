//! Data models for card transactions and the gateway wire contract.

/// Gateway request/response wire types
pub mod gateway;
/// Card transaction records and API types
pub mod transaction;
