//! Credential primitives: redacted token secrets and JWT claim probes.

pub mod token;

pub use token::{claims::*, secret::*};
