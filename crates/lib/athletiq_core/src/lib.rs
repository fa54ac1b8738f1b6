//! # athletiq_core
//!
//! Core domain logic for the AthletIQ coach service: request models, prompt
//! construction, identity and tenant resolution, and the streaming chat
//! provider client.

pub mod identity;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod tenant;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
