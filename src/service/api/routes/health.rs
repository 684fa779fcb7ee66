use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello!" }))
}

/// Liveness check: `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        time: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_greets() {
        let Json(body) = root().await;
        assert_eq!(body["message"], "Hello!");
    }

    #[tokio::test]
    async fn health_is_healthy() {
        let Json(resp) = health().await;
        assert_eq!(resp.status, "healthy");
    }
}
