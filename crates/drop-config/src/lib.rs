//! # Drop Config
//!
//! Configuration types for the Drop API, loaded from environment variables:
//!
//! - [`web`]: listener addresses, timeouts and build string
//! - [`auth`]: key folder, signing algorithm, issuer and token lifetime
//!
//! # Example
//!
//! ```ignore
//! use drop_config::{AuthConfig, WebConfig};
//!
//! drop_config::load_dotenv();
//! let web = WebConfig::from_env();
//! let auth = AuthConfig::from_env();
//! ```

pub mod auth;
pub mod web;

// Re-export commonly used types at crate root
pub use auth::AuthConfig;
pub use web::WebConfig;

/// Loads a `.env` file from the working directory if one exists.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}
