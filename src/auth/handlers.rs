use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RefreshRequest, SignupRequest},
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::is_unique_violation,
        repo_types::User,
        services::{issue_tokens, normalize_email, validate_signup},
        session::SESSION_COOKIE,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/token/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(get_me))
}

fn session_cookie(sid: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, sid))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn open_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let sid = state.sessions.create(user.id).await?;
    Ok(jar.add(session_cookie(sid)))
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    let name = payload.name.trim();
    let email = normalize_email(&payload.email);

    if let Err(e) = validate_signup(name, &email, &payload.password) {
        warn!(email = %email, reason = %e, "signup rejected");
        return Err(e);
    }

    match User::find_by_email(&state.db, &email).await {
        Ok(Some(_)) => {
            warn!(email = %email, "email already registered");
            return Err(AppError::bad_request("User already exists"));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AppError::internal("Internal server error", e));
        }
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, name, &email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::bad_request("User already exists"));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(AppError::internal("Internal server error", e));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let body = issue_tokens(&keys, &user, "Signup successful")?;
    let jar = open_session(&state, jar, &user).await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((jar, Json(body)))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email and password required"));
    }

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::unauthorized("Invalid credentials"));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AppError::internal("Internal server error", e));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let body = issue_tokens(&keys, &user, "Login successful")?;
    let jar = open_session(&state, jar, &user).await?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok((jar, Json(body)))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(sid) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        state.sessions.remove(&sid).await?;
        info!("session closed");
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, Json(MessageResponse { message: "Logged out" })))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::unauthorized("Invalid or expired token")
    })?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| AppError::internal("Internal server error", e))?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    Ok(Json(issue_tokens(&keys, &user, "Token refreshed")?))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
