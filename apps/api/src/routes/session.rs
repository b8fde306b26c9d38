//! Session routes: login and token check.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::gate;
use crate::auth::CurrentPrincipal;
use crate::error::{ApiError, ApiResult};
use crate::services::auth_service::AuthError;
use crate::state::AppState;
use orderdesk_core::validation::SESSION;
use orderdesk_core::{Mode, Role};

#[derive(Debug, Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Clients only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_client: Option<String>,
}

/// Body of a successful token check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub message: &'static str,
    pub user_id: String,
    pub name: String,
    pub role: Role,
}

/// POST /session
///
/// A body that is not JSON or fails the login shape gets the same 401 as a
/// wrong password.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Ok(Json(payload)) = payload else {
        return Err(AuthError::InvalidCredentials.into());
    };
    let credentials: Credentials = gate(&SESSION, Mode::Create, &payload)
        .map_err(|_| ApiError::from(AuthError::InvalidCredentials))?;

    let session = state
        .auth()
        .authenticate(&credentials.email, &credentials.password)
        .await?;

    Ok(Json(SessionResponse {
        token: session.token,
        name: session.name,
        email: session.email,
        role: session.principal.role,
        number_client: session.account_number,
    }))
}

/// GET /check-auth
pub async fn check(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<CheckAuthResponse>> {
    let identity = state.auth().resolve(&principal).await?;

    Ok(Json(CheckAuthResponse {
        message: "Authenticated",
        user_id: identity.principal.id,
        name: identity.name,
        role: identity.principal.role,
    }))
}
