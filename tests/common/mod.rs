//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_proxy;
pub mod stub_kms;
pub mod test_env;
