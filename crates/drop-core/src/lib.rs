//! # Drop Core
//!
//! Core types shared by every Drop crate:
//!
//! - [`errors`]: the application error taxonomy and its HTTP mapping
//! - [`roles`]: role name constants used in claims and route declarations
//!
//! # Example
//!
//! ```ignore
//! use drop_core::{AppError, roles};
//!
//! if !claims.authorized(roles::ADMIN) {
//!     return Err(AppError::Forbidden);
//! }
//! ```

pub mod errors;
pub mod roles;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorCarrier, ErrorResponse, FieldError};
