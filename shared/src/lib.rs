//! VidStream Shared Library
//!
//! This crate contains the request/response types shared between the
//! backend and API clients.

pub mod types;

// Re-export commonly used items
pub use types::*;
