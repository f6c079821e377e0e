//! Authentication module
//!
//! Provides JWT-based authentication with argon2 password hashing and
//! cookie transport for refresh tokens.

pub mod cookie;
mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService};
pub use middleware::AuthUser;
pub use password::PasswordService;
