//! Settings API endpoint
//!
//! Provides POST /api/settings/glm_api_key so the GLM key can be configured
//! at runtime without restarting the service.

use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request payload for setting the GLM API key
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetApiKeyRequest {
    /// The GLM API key to configure
    pub api_key: String,
}

/// Response payload for API key configuration
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/glm_api_key handler
///
/// Request: `{"apiKey": "your-glm-key"}`
/// Response: `{"success": true, "message": "..."}`
///
/// Behavior:
/// 1. Validate key (non-empty, non-whitespace)
/// 2. Write to the settings table (authoritative)
/// 3. Swap the key into the running classification client
///
/// Errors:
/// - 400 Bad Request: empty or whitespace-only key
/// - 500 Internal Server Error: database write failure
pub async fn set_glm_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    if !crate::config::is_valid_key(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }

    crate::db::settings::set_glm_api_key(&state.db, payload.api_key.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    state.glm.set_api_key(payload.api_key).await;

    info!("GLM API key configured via settings endpoint");

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "GLM API key configured successfully".to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/glm_api_key", post(set_glm_api_key))
}
