//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access tokens and opaque refresh tokens.

pub mod jwt;
pub mod password;
