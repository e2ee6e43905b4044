//! Request-scoped context and server lifecycle.
//!
//! - [`values`]: per-request trace id, start time and final status
//! - [`app`]: route registration through a validated middleware [`Chain`](crate::middleware::Chain)
//! - [`shutdown`]: the shared shutdown signal and the draining server loop

pub mod app;
pub mod shutdown;
pub mod values;

pub use app::App;
pub use shutdown::{ServeError, Shutdown, serve_until_shutdown};
pub use values::RequestValues;
