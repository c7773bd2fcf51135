//! SDK for the Gravity Forms REST API.
//!
//! Holds the request-signing algorithm shared by API clients and the
//! server, plus the error body the API answers with. The `client` feature
//! adds a `reqwest` client that signs every request it sends.

pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;

/// REST namespace served by the add-on.
pub const NAMESPACE: &str = "gf/v2";
