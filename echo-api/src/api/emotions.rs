//! Global emotion map endpoint

use crate::db;
use crate::{ApiResult, AppState};
use axum::{extract::State, routing::get, Json, Router};
use echo_common::db::EmotionMapPoint;
use serde::Serialize;

/// Response payload for the emotion map
#[derive(Debug, Serialize)]
pub struct EmotionMapResponse {
    pub data: Vec<EmotionMapPoint>,
}

/// Seeded visualization rows served while no public memories exist yet
fn sample_emotion_map() -> Vec<EmotionMapPoint> {
    [
        ("nostalgia", 8, 35.6597, 139.7006),     // Tokyo
        ("peace", 12, 51.5074, -0.1278),         // London
        ("love", 15, 40.7829, -73.9654),         // New York
        ("joy", 6, -33.8568, 151.2153),          // Sydney
        ("warmth", 9, 48.8566, 2.2936),          // Paris
        ("contemplative", 4, 34.0522, -118.2437), // Los Angeles
        ("grateful", 7, 55.7558, 37.6176),       // Moscow
        ("calm", 5, 19.4326, -99.1332),          // Mexico City
        ("hopeful", 11, -23.5505, -46.6333),     // São Paulo
        ("excitement", 13, 1.3521, 103.8198),    // Singapore
    ]
    .into_iter()
    .map(|(emotion, count, lat, lng)| EmotionMapPoint {
        emotion: emotion.to_string(),
        count,
        lat,
        lng,
    })
    .collect()
}

/// GET /api/emotions/map
///
/// Aggregated `{emotion, count, lat, lng}` rows over public memories for the
/// global visualization. No auth required. Falls back to sample rows while
/// the store is empty.
pub async fn emotion_map(State(state): State<AppState>) -> ApiResult<Json<EmotionMapResponse>> {
    let mut data = db::memories::emotion_map(&state.db).await?;

    if data.is_empty() {
        data = sample_emotion_map();
    }

    Ok(Json(EmotionMapResponse { data }))
}

/// Build emotion map routes
pub fn emotion_routes() -> Router<AppState> {
    Router::new().route("/api/emotions/map", get(emotion_map))
}
