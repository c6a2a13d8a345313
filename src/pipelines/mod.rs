//! Workflow pipelines orchestrating stateless services.

pub mod build;

pub use build::CsrBuilder;
