//! User routes that sit on the trust boundary: token issuance, reading a
//! single user (owner or admin) and the admin-only listing.
//!
//! Persistence is behind the [`store::UserStore`] trait.

pub mod controller;
pub mod model;
pub mod router;
pub mod store;
