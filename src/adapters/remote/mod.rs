//! Remote key-management proxy adapter.
//!
//! Talks to a proxy that fronts the key-management service (for example a
//! small gateway in front of a cloud KMS), exchanging JSON over HTTPS.

pub mod client;
pub mod protocol;

pub use client::{RemoteKmsClient, RemoteKmsConfig};
