//! Domain layer: pure data types for certification requests.
//!
//! Nothing in here performs I/O. Types validate their own invariants and
//! convert into `x509-cert` structures for serialization.

pub mod constants;
pub mod crypto;
pub mod extensions;
pub mod name;
pub mod public_key;
pub mod request;
pub mod types;
