//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness + database check
//!
//! # Session
//! POST   /session                 - Authenticate, issue token
//! GET    /check-auth              - Verify bearer token, echo identity
//!
//! # Administrators
//! POST   /createUser              - Register administrator
//! GET    /getUser                 - List administrators
//!
//! # Clients
//! POST   /createClient            - Register client
//! GET    /getClient               - List clients
//! PUT    /updateClient/{id}       - Partial client update
//! PUT    /recoverPassword         - Reset password with recovery code
//!
//! # Orders
//! POST   /createOrderProducts     - Create order + line items
//! GET    /getListOrderProducts    - List orders with line items
//! PUT    /updateListOrder/{id}    - Update order, optionally replace items
//! PUT    /updateListOrder?id=     - Same, id as query parameter
//! DELETE /deleteOrder/{id}        - Delete order and its items
//! ```
//!
//! Every mutating handler runs its body through the validation gate before
//! touching storage.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::http::{Request, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use orderdesk_core::{validate, Mode, Shape};

pub mod administrators;
pub mod clients;
pub mod health;
pub mod orders;
pub mod session;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Session
        .route("/session", post(session::create))
        .route("/check-auth", get(session::check))
        // Administrators
        .route("/createUser", post(administrators::create))
        .route("/getUser", get(administrators::list))
        // Clients
        .route("/createClient", post(clients::create))
        .route("/getClient", get(clients::list))
        .route("/updateClient/{id}", put(clients::update))
        .route("/recoverPassword", put(clients::recover_password))
        // Orders
        .route("/createOrderProducts", post(orders::create))
        .route("/getListOrderProducts", get(orders::list))
        .route("/updateListOrder", put(orders::update_by_query))
        .route("/updateListOrder/{id}", put(orders::update))
        .route("/deleteOrder/{id}", delete(orders::delete))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record("latency_ms", latency.as_millis() as u64);
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Unwraps a JSON body, turning a malformed or missing body into a 400.
pub(crate) fn json_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Runs `payload` through the validation gate and deserializes the
/// sanitized result.
pub(crate) fn gate<T: DeserializeOwned>(shape: &Shape, mode: Mode, payload: &Value) -> ApiResult<T> {
    let sanitized = validate(shape, mode, payload)?;
    serde_json::from_value(Value::Object(sanitized)).map_err(|e| {
        ApiError::Internal(format!("sanitized {} payload did not deserialize: {}", shape.name, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::validation::ORDER;
    use orderdesk_core::{NewOrder, OrderChanges};
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_gate_converts_numeric_strings() {
        let order: NewOrder = gate(
            &ORDER,
            Mode::Create,
            &json!({
                "client_id": "0b8f2c1e-7d43-4f7e-9a39-3f1c2d8e5a10",
                "order_number": "A-1",
                "status": "open",
                "status_description": "awaiting payment",
                "total": "150",
                "products": [{ "product_name": "Widget", "quantity": 3, "price": "50" }]
            }),
        )
        .unwrap();

        assert_eq!(order.total, Decimal::from(150));
        assert_eq!(order.products[0].subtotal(), Decimal::from(150));
    }

    #[test]
    fn test_gate_keeps_numeric_string_precision() {
        let order: NewOrder = gate(
            &ORDER,
            Mode::Create,
            &json!({
                "client_id": "0b8f2c1e-7d43-4f7e-9a39-3f1c2d8e5a10",
                "order_number": "A-2",
                "status": "open",
                "status_description": "awaiting payment",
                "total": "3.0000000000000003",
                "products": [{ "product_name": "Shim", "quantity": "1.0000000000000001", "price": "3" }]
            }),
        )
        .unwrap();

        let expected = Decimal::from_str("3.0000000000000003").unwrap();
        assert_eq!(order.products[0].subtotal(), expected);
        assert_eq!(order.total, expected);
    }

    #[test]
    fn test_gate_keeps_empty_replacement_batch() {
        let changes: OrderChanges =
            gate(&ORDER, Mode::Update, &json!({ "status": "closed", "products": [] })).unwrap();

        assert_eq!(changes.status.as_deref(), Some("closed"));
        assert_eq!(changes.products, Some(vec![]));
        assert!(changes.total.is_none());
    }

    #[test]
    fn test_gate_reports_validation_errors() {
        let err = gate::<OrderChanges>(&ORDER, Mode::Update, &json!({ "total": -1 })).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref errors) if errors.has_field("total")));
    }
}
