use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser},
        jwt::JwtKeys,
        repo_types::User,
    },
    error::AppError,
};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks run in order; the first failure is reported.
pub(crate) fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), AppError> {
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(AppError::bad_request("Name must be at least 2 characters"));
    }
    if !is_valid_email(email) {
        return Err(AppError::bad_request("Invalid email format"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::bad_request(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

pub(crate) fn issue_tokens(
    keys: &JwtKeys,
    user: &User,
    message: &'static str,
) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        message,
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        token_type: "bearer",
        user: PublicUser::from(user),
    })
}
