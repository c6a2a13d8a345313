//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for cryptographic artifacts including:
//! - Local digest computation for the pre-hashed message mode
//! - Signing algorithm selectors and their `AlgorithmIdentifier` mapping
//! - Raw signature values returned by the key-management service

mod algorithm;
mod hash;
mod signature;

pub use algorithm::{SignatureAlgorithmChoice, SignatureFamily, SignerAlgorithm};
pub use hash::{compute_digest, HashAlgorithm};
pub use signature::CsrSignature;
