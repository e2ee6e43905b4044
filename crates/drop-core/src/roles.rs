//! Role names carried in token claims.
//!
//! Authorization is plain role membership; these constants keep the strings
//! consistent between token issuance and route declarations.

/// Full access to every user's data.
pub const ADMIN: &str = "ADMIN";
/// Regular account; may only act on its own resources.
pub const USER: &str = "USER";
