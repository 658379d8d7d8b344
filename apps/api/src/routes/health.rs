use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Reports service version and database reachability.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let started = Instant::now();
    let database = state.plans.ping().await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let (status, database_status) = match database {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!("Health check database ping failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "service": "compliance-api",
            "database": {
                "status": database_status,
                "latency_ms": latency_ms
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use tower::ServiceExt;

    use crate::routes::build_router;
    use crate::testing::{body_json, json_request, test_app, StubGenerator};

    use super::*;

    #[tokio::test]
    async fn test_health_reports_database() {
        let app = test_app(StubGenerator::replying("plan"));
        let response = build_router(app.state)
            .oneshot(json_request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "ok");
    }
}
