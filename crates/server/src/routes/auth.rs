use std::sync::LazyLock;

use axum::{Extension, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{jwt, middleware::AuthUser, password};
use crate::config::Config;
use crate::db::{accounts, sessions};
use crate::error::AppError;
use crate::notify::{Event, Notifier, Recipients};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_@.+-]+$").unwrap());

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

fn account_to_response(a: &accounts::Account) -> UserResponse {
    UserResponse {
        id: a.id,
        username: a.username.clone(),
        email: a.email.clone(),
        first_name: a.first_name.clone(),
        last_name: a.last_name.clone(),
        created_at: a.created_at.to_rfc3339(),
    }
}

/// Field checks for a join request, in the order a form would report them.
fn validate_join(req: &JoinRequest) -> Result<(), AppError> {
    if req.username.len() < 3 {
        return Err(AppError::BadRequest(
            "Username must be at least 3 characters".into(),
        ));
    }
    if req.username.len() > 30 {
        return Err(AppError::BadRequest(
            "Username must be at most 30 characters".into(),
        ));
    }
    if !USERNAME_RE.is_match(&req.username) {
        return Err(AppError::BadRequest(
            "Username can only contain letters, numbers, and @/./+/-/_".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Enter a valid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    if req.password != req.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match.".into()));
    }
    Ok(())
}

/// POST /api/auth/join
pub async fn join(
    Extension(pool): Extension<PgPool>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_join(&req)?;

    if accounts::email_exists(&pool, &req.email).await? {
        return Err(AppError::BadRequest("Email already registered".into()));
    }
    if accounts::username_exists(&pool, &req.username).await? {
        return Err(AppError::BadRequest("Username already taken".into()));
    }

    let hash = password::hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let account_id = accounts::create_account(
        &pool,
        &accounts::NewAccount {
            username: &req.username,
            email: &req.email,
            password_hash: &hash,
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
        },
    )
    .await?;

    let account = accounts::get_account_by_id(&pool, account_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created account".into()))?;

    tracing::info!("New account {} ({})", account.username, account.id);
    Ok(Json(account_to_response(&account)))
}

/// POST /api/auth/login
pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Extension(notifier): Extension<Notifier>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = accounts::get_account_by_username(&pool, &req.username)
        .await?
        .ok_or(AppError::BadRequest("Incorrect username or password".into()))?;

    let valid = password::verify_password(&req.password, &account.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !valid {
        return Err(AppError::BadRequest("Incorrect username or password".into()));
    }
    if !account.is_active {
        return Err(AppError::Forbidden("Your account is inactive.".into()));
    }

    // Logging in ends every other session of this account.
    let (session_id, expires_at) =
        sessions::start_session(&pool, account.id, config.session_hours).await?;

    let token = jwt::create_token(account.id, session_id, expires_at, &config.jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token creation error: {e}")))?;

    notifier.publish(Recipients::Everyone, Event::PresenceChanged);

    Ok(Json(AuthResponse {
        user: account_to_response(&account),
        token,
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    Extension(pool): Extension<PgPool>,
    Extension(notifier): Extension<Notifier>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    sessions::end_session(&pool, user.session_id).await?;
    notifier.publish(Recipients::Everyone, Event::PresenceChanged);
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: user.created_at.to_rfc3339(),
    }))
}
