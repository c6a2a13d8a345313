//! Adapter layer for the external key-management service.
//!
//! Provides:
//! - The service port (`backend`), in blocking and async flavours
//! - A JSON-over-HTTPS client for a remote key-management proxy

pub mod backend;
pub mod remote;
