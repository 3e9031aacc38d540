//! Shared building blocks for the workspace: logging setup and small
//! response types used by more than one crate.

pub mod types;
pub mod utils;
