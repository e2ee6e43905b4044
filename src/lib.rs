//! # Drop API
//!
//! A REST backend whose core is the request trust pipeline: token-based
//! authentication with rotating keys, role-based authorization, and an
//! ordered middleware chain wrapping every route.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── drop-core/     # AppError taxonomy, role constants
//! ├── drop-config/   # Environment-driven configuration
//! ├── drop-auth/     # KeyStore, Claims, TokenAuthority
//! └── drop-cli/      # drop-admin: genkey, gentoken
//! src/
//! ├── middleware/    # Stage/Chain plus the errors, panics, auth and role stages
//! ├── modules/users/ # Token issuance and user lookup routes
//! ├── web/           # RequestValues, App route registry, shutdown
//! ├── debug.rs       # Readiness, liveness and metrics listener
//! ├── logging.rs     # Tracing setup and the Logger stage
//! ├── metrics.rs     # Prometheus recorder and the Metrics stage
//! └── router.rs      # API routes and global stages
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Logger → Panics → Metrics → Errors → [Authenticate → Authorize(role)] → handler
//! ```
//!
//! Each stage may answer on its own without calling the next one. Handlers
//! return [`drop_core::AppError`]; the `Errors` stage turns it into the client
//! response and logs the detail that clients never see.
//!
//! ## Keys and tokens
//!
//! Signing keys are Ed25519 PKCS#8 PEM files named `<kid>.pem` in
//! `DROP_AUTH_KEYS_FOLDER`. Tokens carry the `kid` that signed them, so adding
//! a key file and switching new issuance to it rotates keys without
//! invalidating tokens already in circulation.
//!
//! ```bash
//! drop-admin genkey --kid k1
//! drop-admin gentoken --kid k1 --subject u1 --roles ADMIN
//! ```

pub mod debug;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod web;

// Re-export workspace crates for convenience
pub use drop_auth;
pub use drop_config;
pub use drop_core;
