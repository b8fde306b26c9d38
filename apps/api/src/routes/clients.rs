//! Client registration, listing, update and password recovery.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{gate, json_body};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use orderdesk_core::validation::{CLIENT, PASSWORD_RECOVERY};
use orderdesk_core::{Client, ClientChanges, Mode, NewClient, PasswordRecovery};

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub message: &'static str,
    pub client: Client,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /createClient
///
/// The account number and recovery code are generated here; the recovery
/// code is never echoed back.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ClientResponse>)> {
    let payload = json_body(payload)?;
    let new: NewClient = gate(&CLIENT, Mode::Create, &payload)?;

    let client = state.db().clients().create(&new).await?;
    info!(id = %client.id, number_client = %client.account_number, "Client registered");

    Ok((
        StatusCode::CREATED,
        Json(ClientResponse {
            message: "User created successfully",
            client,
        }),
    ))
}

/// GET /getClient
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(state.db().clients().list().await?))
}

/// PUT /updateClient/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ClientResponse>> {
    let payload = json_body(payload)?;
    let changes: ClientChanges = gate(&CLIENT, Mode::Update, &payload)?;

    let client = state.db().clients().update(&id, &changes).await?;
    info!(id = %client.id, "Client updated");

    Ok(Json(ClientResponse {
        message: "User updated successfully",
        client,
    }))
}

/// PUT /recoverPassword
pub async fn recover_password(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let payload = json_body(payload)?;
    let recovery: PasswordRecovery = gate(&PASSWORD_RECOVERY, Mode::Create, &payload)?;

    let client = state
        .db()
        .clients()
        .recover_password(&recovery.recovery_code, &recovery.password)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid update number".to_string()))?;
    info!(id = %client.id, "Client password recovered");

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
