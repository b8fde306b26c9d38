//! Health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;
use orderdesk_db::migrations::migration_status;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations: MigrationReport,
}

#[derive(Debug, Serialize)]
pub struct MigrationReport {
    pub total: usize,
    pub applied: usize,
}

/// GET /health
///
/// 503 when the database does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db().health_check().await;
    let (total, applied) = match migration_status(state.db().pool()).await {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read migration status");
            (0, 0)
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        tracing::warn!("Health check failed: database unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "unavailable" },
            database,
            migrations: MigrationReport { total, applied },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use orderdesk_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_healthy_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let (status, Json(body)) = health(State(AppState::new(&ApiConfig::default(), db))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.database);
        assert_eq!(body.migrations.applied, body.migrations.total);
    }

    #[tokio::test]
    async fn test_closed_database_is_unavailable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        let (status, Json(body)) = health(State(AppState::new(&ApiConfig::default(), db))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unavailable");
        assert_eq!(body.migrations.applied, 0);
        assert_eq!(body.migrations.total, 0);
    }
}
