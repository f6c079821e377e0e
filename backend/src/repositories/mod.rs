//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod target;
pub mod user;
pub mod vote;

pub use target::TargetRepository;
pub use user::{UserRecord, UserRepository};
pub use vote::{TargetType, VoteKind, VoteRecord, VoteRepository};
