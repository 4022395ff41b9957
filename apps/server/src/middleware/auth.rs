//! Session guard middleware.
//!
//! Both guards resolve the caller from the session token once per request
//! and hand the result downstream as a `CurrentUser` request extension, so
//! handlers never touch ambient session state.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_store::ParkingStore;
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::{AppState, SharedState};

/// The identity resolved for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Administrator flag, as stored right now (not as issued).
    pub is_admin: bool,
}

/// Extracts the session token from the Authorization header.
fn extract_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Validates the session token and resolves the user it names.
///
/// The store lookup catches accounts deleted or demoted after the token was
/// issued.
async fn resolve_user<S: ParkingStore>(
    state: &AppState<S>,
    token: Option<&str>,
) -> Result<CurrentUser, ServerError> {
    let token = token.ok_or(ServerError::AuthenticationRequired)?;

    let claims = state
        .sessions
        .validate_token(token)
        .map_err(|_| ServerError::AuthenticationRequired)?;
    let user_id = claims
        .user_id()
        .map_err(|_| ServerError::AuthenticationRequired)?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or(ServerError::AuthenticationRequired)?;

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    })
}

/// Requires a valid session.
pub async fn require_auth<S: ParkingStore + 'static>(
    State(state): State<SharedState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, extract_token(&request)).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Requires a valid session belonging to an administrator.
pub async fn require_admin<S: ParkingStore + 'static>(
    State(state): State<SharedState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, extract_token(&request)).await {
        Ok(user) if user.is_admin => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(_) => ServerError::PermissionDenied("Admin access required".to_string()).into_response(),
        Err(err) => err.into_response(),
    }
}
