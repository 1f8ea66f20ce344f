use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use foodhub_types::domain::identity::{Identity, Role, UserStatus};
use foodhub_types::ports::identity_provider::{Credentials, IdentityError, IdentityProvider};

/// Resolves callers against the external auth service by forwarding the
/// request's credentials to its session endpoint.
#[derive(Clone)]
pub struct AuthServiceIdentity {
    client: reqwest::Client,
    session_url: Url,
}

#[derive(Deserialize)]
struct SessionEnvelope {
    user: Option<SessionUser>,
}

#[derive(Deserialize)]
struct SessionUser {
    id: String,
    role: Option<String>,
    status: Option<String>,
}

impl AuthServiceIdentity {
    pub fn new(base_url: &str, client: reqwest::Client) -> anyhow::Result<Self> {
        // Relative join on a slash-terminated base keeps any path prefix.
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let session_url = base.join("api/auth/get-session")?;
        Ok(Self {
            client,
            session_url,
        })
    }
}

#[async_trait]
impl IdentityProvider for AuthServiceIdentity {
    async fn get_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Identity>, IdentityError> {
        if credentials.authorization.is_none() && credentials.cookie.is_none() {
            return Ok(None);
        }
        let mut req = self.client.get(self.session_url.clone());
        if let Some(auth) = &credentials.authorization {
            req = req.header(AUTHORIZATION, auth);
        }
        if let Some(cookie) = &credentials.cookie {
            req = req.header(COOKIE, cookie);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            s if !s.is_success() => {
                return Err(IdentityError::Upstream(format!("unexpected status {s}")))
            }
            _ => {}
        }
        // The service answers `null` when there is no session.
        let envelope: Option<SessionEnvelope> = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;
        Ok(envelope.and_then(|e| e.user).map(|u| Identity {
            user_id: u.id,
            role: Role::from_claim(u.role.as_deref()),
            status: UserStatus::from_claim(u.status.as_deref()),
        }))
    }
}
