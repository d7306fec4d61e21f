use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, warn};

use crate::{
    auth::{
        claims::TokenKind,
        jwt::JwtKeys,
        repo_types::User,
        session::SESSION_COOKIE,
    },
    error::AppError,
    state::AppState,
};

/// The authenticated user, taken from a bearer access token or the session cookie.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = match bearer_token(parts) {
            Some(token) => {
                let keys = JwtKeys::from_ref(state);
                let claims = keys.verify(token).map_err(|_| {
                    warn!("invalid or expired token");
                    AppError::unauthorized("Invalid or expired token")
                })?;
                if claims.kind != TokenKind::Access {
                    return Err(AppError::unauthorized("Access token required"));
                }
                claims
                    .user_id()
                    .ok_or_else(|| AppError::unauthorized("Invalid token"))?
            }
            None => {
                let jar = CookieJar::from_headers(&parts.headers);
                let sid = jar
                    .get(SESSION_COOKIE)
                    .map(|c| c.value().to_string())
                    .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;
                state
                    .sessions
                    .get(&sid)
                    .await?
                    .ok_or_else(|| AppError::unauthorized("Not authenticated"))?
            }
        };

        match User::find_by_id(&state.db, user_id).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                warn!(user_id, "token subject no longer exists");
                Err(AppError::unauthorized("User not found"))
            }
            Err(e) => {
                error!(error = %e, user_id, "load current user failed");
                Err(AppError::internal("Internal server error", e))
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
