//! Health probes
//!
//! `/health` and `/health/live` answer unconditionally; `/health/ready`
//! pings PostgreSQL and the session store and returns 503 when either
//! dependency is down.

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
    pub session_store: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    fn from_result<T, E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self {
                status: "healthy".to_string(),
                message: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                message: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn response(status: &str, checks: Option<HealthChecks>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(response("healthy", None))
}

/// Readiness probe; 503 until both backing stores answer
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = CheckStatus::from_result(db::health_check(&state.db).await);

    // A get on the nil UUID is a cheap round trip through Redis
    let session_store = CheckStatus::from_result(state.sessions().get(uuid::Uuid::nil()).await);

    let ready = database.is_healthy() && session_store.is_healthy();
    let checks = Some(HealthChecks {
        database,
        session_store,
    });

    if ready {
        Ok(Json(response("ready", checks)))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(response("not_ready", checks)),
        ))
    }
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(response("alive", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    #[test]
    fn test_check_status_from_result() {
        let ok = CheckStatus::from_result::<_, anyhow::Error>(Ok(()));
        assert!(ok.is_healthy());

        let err = CheckStatus::from_result::<(), _>(Err(anyhow::anyhow!("down")));
        assert!(!err.is_healthy());
        assert_eq!(err.message.as_deref(), Some("down"));
    }
}
