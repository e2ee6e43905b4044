//! The ordered middleware chain that wraps every route.
//!
//! A route's chain is a list of [`Stage`]s, outermost first:
//!
//! ```text
//! Logger → Panics → Metrics → Errors → Authenticate → Authorize(role) → handler
//! ```
//!
//! - [`Stage::Logger`] creates the [`RequestValues`](crate::web::RequestValues)
//!   and logs start and completion ([`crate::logging`])
//! - [`Stage::Panics`] turns a panicking handler into a 500 ([`panics`])
//! - [`Stage::Metrics`] counts requests and errors ([`crate::metrics`])
//! - [`Stage::Errors`] logs handler errors and renders their client response
//!   ([`errors`])
//! - [`Stage::Authenticate`] verifies the bearer token and stores its claims
//!   ([`auth`])
//! - [`Stage::Authorize`] requires a role in those claims ([`role`])
//!
//! Any stage may answer without calling the next one. Chains are validated
//! when they are built, so a route that authorizes without authenticating
//! never makes it into the router.
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::{Chain, Stage};
//!
//! let chain = Chain::new([Stage::Logger, Stage::Errors, Stage::Authenticate])?
//!     .then(&[Stage::Authorize(roles::ADMIN)])?;
//! let route = chain.wrap(get(handler), &state);
//! ```

pub mod auth;
pub mod errors;
pub mod panics;
pub mod role;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::MethodRouter;
use thiserror::Error;

use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::state::AppState;
use auth::authenticate;
use errors::errors_middleware;
use panics::catch_panic_layer;
use role::{RequiredRole, authorize};

/// One interceptor in a route's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Logger,
    Panics,
    Metrics,
    Errors,
    Authenticate,
    Authorize(&'static str),
}

impl Stage {
    fn rank(self) -> u8 {
        match self {
            Stage::Logger => 0,
            Stage::Panics => 1,
            Stage::Metrics => 2,
            Stage::Errors => 3,
            Stage::Authenticate => 4,
            Stage::Authorize(_) => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Logger => "logger",
            Stage::Panics => "panics",
            Stage::Metrics => "metrics",
            Stage::Errors => "errors",
            Stage::Authenticate => "authenticate",
            Stage::Authorize(_) => "authorize",
        }
    }

    fn apply(self, route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
        match self {
            Stage::Logger => route.layer(from_fn(logging_middleware)),
            Stage::Panics => route.layer(catch_panic_layer()),
            Stage::Metrics => route.layer(from_fn(metrics_middleware)),
            Stage::Errors => {
                route.layer(from_fn_with_state(state.shutdown.clone(), errors_middleware))
            }
            Stage::Authenticate => route.layer(from_fn_with_state(state.auth.clone(), authenticate)),
            Stage::Authorize(role) => route.layer(from_fn_with_state(RequiredRole(role), authorize)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("authorize({role}) needs an authenticate stage before it")]
    AuthorizeWithoutAuthenticate { role: &'static str },

    #[error("stage {stage} cannot follow {previous}")]
    OutOfOrder {
        previous: &'static str,
        stage: &'static str,
    },
}

/// A validated, ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    stages: Vec<Stage>,
}

impl Chain {
    /// Stages must follow the canonical order, each at most once.
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Result<Self, ChainError> {
        let stages: Vec<Stage> = stages.into_iter().collect();

        for pair in stages.windows(2) {
            if pair[1].rank() <= pair[0].rank() {
                return Err(ChainError::OutOfOrder {
                    previous: pair[0].name(),
                    stage: pair[1].name(),
                });
            }
        }

        let authorizes = stages.iter().find_map(|stage| match stage {
            Stage::Authorize(role) => Some(*role),
            _ => None,
        });
        if let Some(role) = authorizes
            && !stages.contains(&Stage::Authenticate)
        {
            return Err(ChainError::AuthorizeWithoutAuthenticate { role });
        }

        Ok(Self { stages })
    }

    /// Appends route-specific stages to this chain.
    pub fn then(&self, stages: &[Stage]) -> Result<Self, ChainError> {
        Self::new(self.stages.iter().chain(stages).copied())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Layers the stages onto `route`, first stage outermost.
    pub fn wrap(&self, route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
        self.stages
            .iter()
            .rev()
            .fold(route, |route, stage| stage.apply(route, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_chain_is_accepted() {
        let chain = Chain::new([
            Stage::Logger,
            Stage::Panics,
            Stage::Metrics,
            Stage::Errors,
            Stage::Authenticate,
            Stage::Authorize("ADMIN"),
        ])
        .unwrap();
        assert_eq!(chain.stages().len(), 6);
    }

    #[test]
    fn test_subsets_are_accepted() {
        assert!(Chain::new([]).is_ok());
        assert!(Chain::new([Stage::Errors, Stage::Authenticate]).is_ok());
        assert!(Chain::new([Stage::Logger, Stage::Metrics]).is_ok());
    }

    #[test]
    fn test_authorize_without_authenticate_is_rejected() {
        let err = Chain::new([Stage::Logger, Stage::Errors, Stage::Authorize("ADMIN")]).unwrap_err();
        assert_eq!(
            err,
            ChainError::AuthorizeWithoutAuthenticate { role: "ADMIN" }
        );
    }

    #[test]
    fn test_authorize_before_authenticate_is_rejected() {
        let err = Chain::new([Stage::Authorize("ADMIN"), Stage::Authenticate]).unwrap_err();
        assert_eq!(
            err,
            ChainError::OutOfOrder {
                previous: "authorize",
                stage: "authenticate"
            }
        );
    }

    #[test]
    fn test_duplicate_stage_is_rejected() {
        let err = Chain::new([Stage::Logger, Stage::Logger]).unwrap_err();
        assert!(matches!(err, ChainError::OutOfOrder { .. }));
    }

    #[test]
    fn test_then_validates_the_combined_chain() {
        let global = Chain::new([Stage::Logger, Stage::Errors]).unwrap();

        assert!(global.then(&[Stage::Authenticate, Stage::Authorize("USER")]).is_ok());
        assert!(global.then(&[Stage::Logger]).is_err());
        assert!(global.then(&[Stage::Authorize("USER")]).is_err());
    }
}
