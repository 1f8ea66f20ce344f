use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

use super::server::AppState;
use crate::errors::AppError;
use foodhub_types::domain::identity::{Identity, Role};
use foodhub_types::ports::identity_provider::Credentials;
use foodhub_types::ports::Store;

pub(super) const CUSTOMER: &[Role] = &[Role::Customer];
pub(super) const PROVIDER: &[Role] = &[Role::Provider];
pub(super) const ADMIN: &[Role] = &[Role::Admin];
pub(super) const MENU_EDITORS: &[Role] = &[Role::Provider, Role::Admin];
pub(super) const ANY_ROLE: &[Role] = &[Role::Admin, Role::Customer, Role::Provider];

fn header(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Resolves the caller and checks them against the roles a route admits.
pub(super) async fn authenticate<R: Store>(
    state: &AppState<R>,
    headers: &HeaderMap,
    allowed: &[Role],
) -> Result<Identity, AppError> {
    let credentials = Credentials {
        authorization: header(headers, AUTHORIZATION),
        cookie: header(headers, COOKIE),
    };
    let identity = state
        .identity
        .get_session(&credentials)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if identity.is_suspended() {
        return Err(AppError::Forbidden("Your account is suspended".into()));
    }
    if !allowed.contains(&identity.role) {
        tracing::debug!(user_id = %identity.user_id, role = ?identity.role, "role not admitted");
        return Err(AppError::Forbidden("Forbidden".into()));
    }
    Ok(identity)
}
