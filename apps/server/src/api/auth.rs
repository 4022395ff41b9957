//! Account API endpoints: registration, login, session info.

use axum::{Extension, Form, Json, extract::State};
use entities::User;
use parking_store::ParkingStore;
use serde::{Deserialize, Serialize};

use crate::api::{MessageResponse, UserInfo};
use crate::error::{ServerError, ServerResult};
use crate::middleware::CurrentUser;
use crate::state::SharedState;

/// Registration form fields.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserInfo,
}

/// Registers a new member account.
pub async fn register<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Form(form): Form<RegisterForm>,
) -> ServerResult<Json<MessageResponse>> {
    let username = form.username.trim().to_string();
    let email = form.email.trim().to_string();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(ServerError::InvalidRequest(
            "Username, email and password are required".to_string(),
        ));
    }

    if state
        .store
        .get_user_by_username(&username)
        .await?
        .is_some()
    {
        return Err(ServerError::DuplicateUsername);
    }
    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ServerError::DuplicateEmail);
    }

    let password_hash = auth::hash_password(&form.password)?;
    let mut user = User::new(username, email, password_hash);
    if let Some(phone) = form.phone.filter(|p| !p.trim().is_empty()) {
        user = user.with_phone(phone);
    }
    let user = state.store.create_user(user).await?;

    tracing::info!(username = %user.username, "User registered");

    Ok(Json(MessageResponse {
        message: "Registration successful! Please log in.".to_string(),
    }))
}

/// Logs a user in, establishing a session token carrying identity and role.
pub async fn login<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Form(form): Form<LoginForm>,
) -> ServerResult<Json<LoginResponse>> {
    let user = state
        .store
        .get_user_by_username(form.username.trim())
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    if !auth::verify_password(&form.password, &user.password_hash)? {
        return Err(ServerError::InvalidCredentials);
    }

    let token = state
        .sessions
        .issue_token(user.id, user.username.clone(), user.is_admin)?;

    tracing::info!(username = %user.username, is_admin = user.is_admin, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.sessions.expiration_seconds(),
        user: user.into(),
    }))
}

/// Gets the current authenticated user.
pub async fn me<S: ParkingStore>(
    State(state): State<SharedState<S>>,
    Extension(current): Extension<CurrentUser>,
) -> ServerResult<Json<UserInfo>> {
    let user = state
        .store
        .get_user(current.id)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Logs out the current user. Sessions are stateless tokens, so the actual
/// discard happens client-side.
pub async fn logout(Extension(current): Extension<CurrentUser>) -> Json<MessageResponse> {
    tracing::info!(username = %current.username, "User logged out");

    Json(MessageResponse {
        message: "You have been logged out.".to_string(),
    })
}
