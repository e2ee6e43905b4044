use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use drop_core::AppError;
use tracing::{debug, warn};

use crate::modules::users::model::{UserInfo, UserRecord};

/// The slice of user persistence the trust pipeline needs.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Checks an email/password pair. Every failure is `AuthenticationFailed`.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserInfo, AppError>;

    async fn query_by_id(&self, id: &str) -> Result<UserInfo, AppError>;

    /// One page of users ordered by id. Pages start at 1.
    async fn query(&self, page: usize, rows: usize) -> Result<Vec<UserInfo>, AppError>;
}

/// Ids are opaque, but restricted to URL-safe characters.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// In-process store seeded at startup.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn new(mut users: Vec<UserRecord>) -> Self {
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            users: Arc::new(users),
        }
    }

    /// Loads a JSON array of [`UserRecord`]s.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading users file {}", path.display()))?;
        let users: Vec<UserRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing users file {}", path.display()))?;
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserInfo, AppError> {
        let Some(user) = self.users.iter().find(|u| u.email == email).cloned() else {
            debug!(email, "no user with this email");
            return Err(AppError::AuthenticationFailed);
        };

        // bcrypt verification blocks for tens of milliseconds
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Unrecognized(e.into()))?;

        match verified {
            Ok(true) => Ok(user.info()),
            Ok(false) => {
                debug!(user_id = %user.id, "password mismatch");
                Err(AppError::AuthenticationFailed)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "stored password hash is unusable");
                Err(AppError::AuthenticationFailed)
            }
        }
    }

    async fn query_by_id(&self, id: &str) -> Result<UserInfo, AppError> {
        if !is_valid_id(id) {
            return Err(AppError::InvalidId);
        }
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(UserRecord::info)
            .ok_or(AppError::NotFound)
    }

    async fn query(&self, page: usize, rows: usize) -> Result<Vec<UserInfo>, AppError> {
        if page == 0 || rows == 0 {
            return Err(AppError::validation("page and rows must be at least 1"));
        }
        Ok(self
            .users
            .iter()
            .skip((page - 1).saturating_mul(rows))
            .take(rows)
            .map(UserRecord::info)
            .collect())
    }
}
