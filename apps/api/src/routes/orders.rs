//! Order aggregate routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{gate, json_body};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use orderdesk_core::validation::ORDER;
use orderdesk_core::{Mode, NewOrder, OrderChanges, OrderWithItems, ValidationError, ValidationErrors};

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub message: &'static str,
    pub order: OrderWithItems,
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub id: Option<String>,
}

/// POST /createOrderProducts
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let payload = json_body(payload)?;
    let new: NewOrder = gate(&ORDER, Mode::Create, &payload)?;

    let order = state.db().orders().create(&new).await?;
    info!(
        id = %order.order.id,
        items = order.products.len(),
        "Order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: "Order created successfully",
            order,
        }),
    ))
}

/// GET /getListOrderProducts
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderWithItems>>> {
    Ok(Json(state.db().orders().list().await?))
}

/// PUT /updateListOrder/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    apply_update(&state, &id, json_body(payload)?).await
}

/// PUT /updateListOrder?id=
pub async fn update_by_query(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<OrderResponse>> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ApiError::from(ValidationErrors::from(ValidationError::Required {
                field: "id".to_string(),
            }))
        })?;

    apply_update(&state, id.trim(), json_body(payload)?).await
}

/// DELETE /deleteOrder/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db().orders().delete(&id).await?;
    info!(%id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(state: &AppState, id: &str, payload: Value) -> ApiResult<Json<OrderResponse>> {
    let changes: OrderChanges = gate(&ORDER, Mode::Update, &payload)?;

    let order = state.db().orders().update(id, &changes).await?;
    info!(
        %id,
        replaced_items = changes.products.is_some(),
        "Order updated"
    );

    Ok(Json(OrderResponse {
        message: "Order updated successfully",
        order,
    }))
}
