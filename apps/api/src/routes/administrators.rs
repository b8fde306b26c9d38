//! Administrator registration and listing.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{gate, json_body};
use crate::error::ApiResult;
use crate::state::AppState;
use orderdesk_core::validation::ADMINISTRATOR;
use orderdesk_core::{Administrator, Mode, NewAdministrator};

#[derive(Debug, Serialize)]
pub struct AdministratorCreated {
    pub message: &'static str,
    pub user: Administrator,
}

/// POST /createUser
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AdministratorCreated>)> {
    let payload = json_body(payload)?;
    let new: NewAdministrator = gate(&ADMINISTRATOR, Mode::Create, &payload)?;

    let user = state.db().administrators().create(&new).await?;
    info!(id = %user.id, "Administrator registered");

    Ok((
        StatusCode::CREATED,
        Json(AdministratorCreated {
            message: "User created successfully",
            user,
        }),
    ))
}

/// GET /getUser
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Administrator>>> {
    Ok(Json(state.db().administrators().list().await?))
}
