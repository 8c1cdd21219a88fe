//! services/api/src/web/auth.rs
//!
//! Session endpoints: login, logout, and the current authentication context.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use protolab_core::domain::AuthContext;
use protolab_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

type AuthResult<T> = Result<T, (StatusCode, String)>;

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub full_name: String,
    pub is_admin: bool,
}

/// Who is behind the session. `profile` is absent for users without one.
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub profile: Option<ProfileResponse>,
}

impl From<&AuthContext> for AuthResponse {
    fn from(ctx: &AuthContext) -> Self {
        Self {
            user_id: ctx.user.user_id,
            email: ctx.user.email.clone(),
            display_name: ctx.display_name().to_string(),
            profile: ctx.profile.as_ref().map(|p| ProfileResponse {
                full_name: p.full_name.clone(),
                is_admin: p.is_admin,
            }),
        }
    }
}

fn internal(what: &str) -> impl FnOnce(PortError) -> (StatusCode, String) + '_ {
    move |e| {
        error!("{}: {:?}", what, e);
        (StatusCode::INTERNAL_SERVER_ERROR, what.to_string())
    }
}

fn session_cookie(value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, value, max_age_secs
    )
}

fn verify_password(stored_hash: &str, password: &str) -> AuthResult<()> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Stored password hash is unreadable: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string()))
}

/// Log in with email and password; sets the session cookie.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let creds = state
        .accounts
        .get_user_by_email(&req.email)
        .await
        .map_err(|e| {
            warn!("Login lookup failed for {}: {:?}", req.email, e);
            (StatusCode::UNAUTHORIZED, BAD_CREDENTIALS.to_string())
        })?;
    verify_password(&creds.hashed_password, &req.password)?;

    let session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    state
        .accounts
        .create_auth_session(&session_id, creds.user_id, Utc::now() + ttl)
        .await
        .map_err(internal("Failed to create session"))?;

    // Resolve the profile now so the client learns whether this is an admin.
    let context = state
        .accounts
        .validate_auth_session(&session_id)
        .await
        .map_err(internal("Failed to load new session"))?;
    info!("User {} logged in", context.user.user_id);

    Ok((
        [(header::SET_COOKIE, session_cookie(&session_id, ttl.num_seconds()))],
        Json(AuthResponse::from(&context)),
    ))
}

/// End the current session and clear the cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;
    state
        .accounts
        .delete_auth_session(session_id)
        .await
        .map_err(internal("Failed to logout"))?;
    Ok([(header::SET_COOKIE, session_cookie("", 0))])
}

/// The user and profile behind the current session.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current session", body = AuthResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn me_handler(Extension(context): Extension<AuthContext>) -> Json<AuthResponse> {
    Json(AuthResponse::from(&context))
}
