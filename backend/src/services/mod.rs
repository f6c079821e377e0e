//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod auth;
pub mod interaction;

pub use auth::{AuthService, AuthenticatedSession, RefreshedSession};
pub use interaction::{InteractionService, VoteOutcome};
