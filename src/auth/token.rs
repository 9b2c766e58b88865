//! Token secret wrapper and claim helpers.

pub mod claims;
pub mod secret;
