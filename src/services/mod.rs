//! Service layer module root.
//! Pure request assembly plus the two calls that cross the service boundary.

pub mod pem;
pub mod public_key_adapter;
pub mod request_assembler;
pub mod request_finalizer;
pub mod signer_gateway;

pub use pem::{decode_csr_pem, pem_armor_csr, read_csr};
pub use public_key_adapter::PublicKeyAdapter;
pub use request_assembler::RequestAssembler;
pub use request_finalizer::RequestFinalizer;
pub use signer_gateway::SignerGateway;
