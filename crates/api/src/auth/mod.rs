//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing.
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Tokens are issued elsewhere; this server only resolves them to a caller.

pub mod jwt;
pub mod password;
