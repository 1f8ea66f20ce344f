use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use foodhub_types::domain::identity::Identity;
use foodhub_types::ports::identity_provider::{Credentials, IdentityError, IdentityProvider};

/// Fixed bearer-token table. Used for local runs and tests in place of the
/// auth service.
#[derive(Clone, Default)]
pub struct StaticIdentity {
    tokens: Arc<DashMap<String, Identity>>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: impl Into<String>, identity: Identity) -> Self {
        self.insert(token, identity);
        self
    }

    pub fn insert(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn get_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Identity>, IdentityError> {
        Ok(credentials
            .bearer_token()
            .and_then(|t| self.tokens.get(t).map(|i| i.clone())))
    }
}
