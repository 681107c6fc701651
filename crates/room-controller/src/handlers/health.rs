//! API health handler.
//!
//! `GET /api/health` is the browser-facing probe. The `/health` and `/ready`
//! probes for orchestration live in [`crate::observability::health`].

use axum::Json;
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApiHealthResponse {
    pub ok: bool,
}

/// Handler for GET /api/health
///
/// ```json
/// { "ok": true }
/// ```
#[instrument(skip_all, name = "rc.api.health")]
pub async fn api_health() -> Json<ApiHealthResponse> {
    Json(ApiHealthResponse { ok: true })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_health_reports_ok() {
        let Json(body) = api_health().await;
        assert_eq!(body, ApiHealthResponse { ok: true });
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"ok":true}"#);
    }
}
