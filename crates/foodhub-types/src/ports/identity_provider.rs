use async_trait::async_trait;

use crate::domain::identity::Identity;

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    #[error("identity service error: {0}")]
    Upstream(String),
}

/// Credentials lifted off an inbound request, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self {
            authorization: Some(format!("Bearer {}", token.as_ref())),
            cookie: None,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolves the caller behind `credentials`, or `None` when there is no
    /// valid session.
    async fn get_session(&self, credentials: &Credentials) -> Result<Option<Identity>, IdentityError>;
}
