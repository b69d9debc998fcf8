use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::JsonOrForm;
use super::{ApiError, AppState, StatusMessage, UserDto};
use crate::db::Role;

const SESSION_USER_KEY: &str = "user";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Identity held by an active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserDto,
}

#[derive(Serialize)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /register
/// Create an account with a hashed password and a typed role.
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonOrForm(payload): JsonOrForm<RegisterRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() || payload.role.is_empty() {
        return Err(ApiError::validation("Missing required fields"));
    }

    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::validation(format!("Invalid role: {}", payload.role)))?;

    // Existence check and insert are two separate statements; concurrent
    // registrations of the same name can race. The unique index makes the
    // loser fail instead of duplicating the row.
    let existing = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Registration error: {e}")))?;

    if existing.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    state
        .store()
        .create_user(&payload.username, &payload.password, role)
        .await
        .map_err(|e| ApiError::internal(format!("Registration failed: {e}")))?;

    tracing::info!("Registered {} account '{}'", role, payload.username);

    Ok(Json(StatusMessage::ok("Registration successful")))
}

/// POST /login
/// Authenticate with username and password, establishes a cookie session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    JsonOrForm(payload): JsonOrForm<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Missing username or password"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let session_user = SessionUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
    };

    if let Err(e) = session.insert(SESSION_USER_KEY, &session_user).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    Ok(Json(LoginResponse {
        success: true,
        user: user.into(),
    }))
}

/// POST /logout
/// Destroy the current session. Succeeds with or without one.
pub async fn logout(session: Session) -> Result<Json<StatusMessage>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear session: {e}")))?;

    Ok(Json(StatusMessage::ok("Logged out successfully")))
}

/// GET /check_session
/// Report whether a session is active and the identity it holds.
pub async fn check_session(session: Session) -> Json<SessionStatusResponse> {
    match session.get::<SessionUser>(SESSION_USER_KEY).await {
        Ok(Some(user)) => Json(SessionStatusResponse {
            authenticated: true,
            user: Some(UserDto {
                id: user.id,
                username: user.username,
                role: user.role,
            }),
        }),
        _ => Json(SessionStatusResponse {
            authenticated: false,
            user: None,
        }),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Get the session identity, if any
pub(crate) async fn current_user(session: &Session) -> Result<Option<SessionUser>, ApiError> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Require an active session with the given role. Missing session and
/// wrong role both report the same denial message.
pub(crate) async fn require_role(
    session: &Session,
    role: Role,
    denial: &str,
) -> Result<SessionUser, ApiError> {
    match current_user(session).await? {
        Some(user) if user.role == role => Ok(user),
        _ => Err(ApiError::Forbidden(denial.to_string())),
    }
}
