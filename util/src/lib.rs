//! Shared building blocks used across the notebook/transformer/sandbox/
//! orchestrator crates: corpus identifier validation, corpus directory
//! layout helpers, and the sandbox resource-limit configuration.

pub mod identifiers;
pub mod paths;
pub mod sandbox_config;

pub use identifiers::{UtilError, validate_identifier};
pub use sandbox_config::SandboxConfig;
