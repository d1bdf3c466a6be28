//! Emotion analysis API endpoints
//!
//! Classification never fails from the caller's point of view: any remote
//! failure degrades to the keyword fallback inside the client, so these
//! handlers only reject invalid input.

use crate::services::EmotionAnalysis;
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;

/// Response payload wrapping one analysis
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: EmotionAnalysis,
}

/// POST /api/ai/analyze-emotion
///
/// Request: `{"text": "...", "context": "..."}` (context optional)
/// Response: `{"analysis": {...}}`
///
/// Errors: 400 when `text` is missing, not a string, or empty.
pub async fn analyze_emotion(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<AnalysisResponse>> {
    let text = match body.get("text").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => text,
        _ => {
            return Err(ApiError::BadRequest(
                "Text is required for analysis".to_string(),
            ))
        }
    };

    let analysis = state.glm.analyze_emotion(text).await;

    Ok(Json(AnalysisResponse { analysis }))
}

/// POST /api/ai/analyze-voice
///
/// Request: `{"transcript": "...", "context": "..."}` (context optional)
/// Response: `{"analysis": {...}}`
///
/// Errors: 400 when `transcript` is missing, not a string, or empty.
pub async fn analyze_voice(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<AnalysisResponse>> {
    let transcript = match body.get("transcript").and_then(Value::as_str) {
        Some(transcript) if !transcript.is_empty() => transcript,
        _ => {
            return Err(ApiError::BadRequest(
                "Voice transcript is required for analysis".to_string(),
            ))
        }
    };

    let context = body.get("context").and_then(Value::as_str);

    let analysis = state.glm.analyze_voice_transcript(transcript, context).await;

    Ok(Json(AnalysisResponse { analysis }))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/analyze-emotion", post(analyze_emotion))
        .route("/api/ai/analyze-voice", post(analyze_voice))
}
