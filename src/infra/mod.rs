//! Infrastructure layer for cross-cutting concerns.
//!
//! Provides:
//! - Configuration files describing a request and the service endpoint
//! - Error and result types

pub mod config;
pub mod error;
