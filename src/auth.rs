//! Admin gate for cache eviction, stats and CSV export.

use std::collections::HashSet;

use crate::error::{MovieEngineError, Result};

/// Who a verified token belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

/// Token verification capability
pub trait Authenticator: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity>;
}

/// Accepts a fixed set of admin tokens
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashSet<String>,
}

impl StaticTokenAuthenticator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::<String>::into)
                .filter(|t| !t.trim().is_empty())
                .collect(),
        }
    }

    /// Tokens from a comma-separated list, e.g. the `ADMIN_TOKENS` variable
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn verify(&self, token: &str) -> Result<Identity> {
        if !token.is_empty() && self.tokens.contains(token) {
            Ok(Identity {
                subject: "admin".to_string(),
            })
        } else {
            Err(MovieEngineError::Unauthorized("invalid token".to_string()))
        }
    }
}

/// Token part of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header
        .ok_or_else(|| MovieEngineError::Unauthorized("missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MovieEngineError::Unauthorized("expected a Bearer token".to_string()))
}

/// Verify the bearer token carried by `header`
pub fn authorize(authenticator: &dyn Authenticator, header: Option<&str>) -> Result<Identity> {
    authenticator.verify(bearer_token(header)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(bearer_token(None).is_err());
        assert!(bearer_token(Some("Basic abc")).is_err());
        assert!(bearer_token(Some("Bearer   ")).is_err());
    }

    #[test]
    fn test_static_tokens() {
        let auth = StaticTokenAuthenticator::from_list("s3cret, other ,");

        assert!(auth.verify("s3cret").is_ok());
        assert!(auth.verify("other").is_ok());
        assert!(matches!(
            auth.verify("guess"),
            Err(MovieEngineError::Unauthorized(_))
        ));
        assert!(auth.verify("").is_err());
    }

    #[test]
    fn test_empty_list_rejects_everything() {
        let auth = StaticTokenAuthenticator::from_list("");
        assert!(auth.is_empty());
        assert!(authorize(&auth, Some("Bearer anything")).is_err());
    }

    #[test]
    fn test_authorize() {
        let auth = StaticTokenAuthenticator::new(["t0k3n"]);
        let identity = authorize(&auth, Some("Bearer t0k3n")).unwrap();
        assert_eq!(identity.subject, "admin");
    }
}
