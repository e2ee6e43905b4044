//! Token payload.
//!
//! [`Claims`] carry the authenticated identity (`sub`) and its roles. Role
//! membership via [`Claims::authorized`] is the only authorization primitive;
//! composite rules such as "admin or owner" are evaluated at the call site.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// JWT claims for access tokens.
///
/// # Fields
///
/// - `sub`: opaque identity of the token owner
/// - `roles`: role strings such as `"ADMIN"` or `"USER"`
/// - `iss`: issuer
/// - `iat`: issued-at (unix seconds)
/// - `exp`: expiry (unix seconds), always after `iat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims valid for `ttl_secs` seconds from `issued_at`.
    ///
    /// Fails with [`AuthError::InvalidClaims`] when the expiry cannot be
    /// represented.
    pub fn new(
        subject: impl Into<String>,
        roles: Vec<String>,
        issuer: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl_secs: i64,
    ) -> Result<Self, AuthError> {
        let expires_at = TimeDelta::try_seconds(ttl_secs)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or(AuthError::InvalidClaims("token lifetime out of range"))?;

        Ok(Self {
            sub: subject.into(),
            roles,
            iss: issuer.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// True iff `role` is one of the claimed roles.
    pub fn authorized(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub(crate) fn validate(&self) -> Result<(), AuthError> {
        if self.sub.trim().is_empty() {
            return Err(AuthError::InvalidClaims("subject must not be empty"));
        }
        if self.exp <= self.iat {
            return Err(AuthError::InvalidClaims("expiry must follow issue time"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(roles: &[&str]) -> Claims {
        Claims::new(
            "u1",
            roles.iter().map(|r| r.to_string()).collect(),
            "drop project",
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            3600,
        )
        .unwrap()
    }

    #[test]
    fn test_authorized_is_role_membership() {
        let admin = claims(&["USER", "ADMIN"]);
        let user = claims(&["USER"]);
        let nobody = claims(&[]);

        assert!(admin.authorized("ADMIN"));
        assert!(!user.authorized("ADMIN"));
        assert!(user.authorized("USER"));
        assert!(!nobody.authorized("USER"));
    }

    #[test]
    fn test_authorized_is_case_sensitive() {
        assert!(!claims(&["admin"]).authorized("ADMIN"));
    }

    #[test]
    fn test_new_sets_expiry_from_ttl() {
        let c = claims(&["USER"]);
        assert_eq!(c.exp - c.iat, 3600);
        assert_eq!(c.expires_at().unwrap() - c.issued_at().unwrap(), TimeDelta::hours(1));
    }

    #[test]
    fn test_new_rejects_unrepresentable_lifetime() {
        let now = Utc::now();
        for ttl in [10_000_000_000_000, 10_000_000_000_000_000, i64::MAX] {
            assert!(matches!(
                Claims::new("u1", vec![], "drop project", now, ttl),
                Err(AuthError::InvalidClaims(_))
            ));
        }
    }

    #[test]
    fn test_validate_rejects_non_increasing_expiry() {
        let mut c = claims(&["USER"]);
        c.exp = c.iat;
        assert!(matches!(c.validate(), Err(AuthError::InvalidClaims(_))));
    }

    #[test]
    fn test_claims_serialize_field_names() {
        let serialized = serde_json::to_string(&claims(&["USER"])).unwrap();
        assert!(serialized.contains(r#""sub":"u1""#));
        assert!(serialized.contains(r#""roles":["USER"]"#));
        assert!(serialized.contains(r#""iss":"drop project""#));
    }

    #[test]
    fn test_claims_deserialize_without_roles() {
        let json = r#"{"sub":"u2","iss":"drop project","iat":1,"exp":2}"#;
        let c: Claims = serde_json::from_str(json).unwrap();
        assert!(c.roles.is_empty());
        assert_eq!(c.sub, "u2");
    }
}
