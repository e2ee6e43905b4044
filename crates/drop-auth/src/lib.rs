//! # Drop Auth
//!
//! Key-rotation-aware token authentication for the Drop API.
//!
//! This crate provides:
//!
//! - [`keystore`]: Ed25519 signing keys loaded from `<kid>.pem` files
//! - [`jwt`]: the [`TokenAuthority`] that issues and verifies tokens
//! - [`claims`]: the token payload and its role predicate
//!
//! Everything here is immutable once built and is shared across request
//! tasks behind an `Arc`.

pub mod claims;
pub mod error;
pub mod jwt;
pub mod keystore;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use error::AuthError;
pub use jwt::TokenAuthority;
pub use keystore::{Key, KeyStore, generate_private_key_pem};
