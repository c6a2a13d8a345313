//! Hash algorithm domain type.
//!
//! Re-exports the crate-level `HashAlgorithm` and computes digests for the
//! pre-hashed message mode. In RAW mode the service hashes; nothing here runs.

pub use crate::HashAlgorithm;

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Compute the digest of `data` with `algo`.
///
/// The result is always `algo.digest_size()` bytes long.
#[must_use]
pub fn compute_digest(algo: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match algo {
        HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}
