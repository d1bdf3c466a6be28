//! Memory API endpoints
//!
//! Creation (with server-side emotion classification), geospatial nearby
//! lookup, owner-scoped edits, and unlock recording.

use crate::db;
use crate::db::memories::MemoryUpdate;
use crate::services::EmotionAnalysis;
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use echo_common::db::{AccessType, Memory, MemoryUnlock, NearbyMemory};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Request payload for creating a memory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryRequest {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub audio_data: Option<String>,
    pub audio_url: Option<String>,
    /// When absent, the server classifies content/description/title
    pub emotion: Option<String>,
    pub emotion_confidence: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub duration: Option<i64>,
    pub access_type: Option<AccessType>,
}

#[derive(Debug, Serialize)]
pub struct CreateMemoryResponse {
    pub memory: Memory,
    /// Present when the server ran the classification step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<EmotionAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub memory: Memory,
}

#[derive(Debug, Serialize)]
pub struct MemoriesResponse {
    pub memories: Vec<Memory>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub data: Vec<NearbyMemory>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    /// Search radius in meters
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQueryParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Search radius in meters
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoryRequest {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub emotion: Option<String>,
    pub access_type: Option<AccessType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMemoryParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteMemoryResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockMemoryRequest {
    pub unlocked_by: Option<String>,
    pub echo_content: Option<String>,
    pub echo_audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub unlock: MemoryUnlock,
}

#[derive(Debug, Serialize)]
pub struct UnlocksResponse {
    pub unlocks: Vec<MemoryUnlock>,
}

fn validate_coordinates(latitude: f64, longitude: f64) -> ApiResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::BadRequest(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::BadRequest(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

fn required_field(value: Option<String>, message: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

/// POST /api/memories
///
/// Creates a memory. When no emotion is supplied the server classifies the
/// content (falling back to description, then title) and persists the
/// resulting label and confidence.
pub async fn create_memory(
    State(state): State<AppState>,
    Json(req): Json<CreateMemoryRequest>,
) -> ApiResult<Json<CreateMemoryResponse>> {
    let user_id = required_field(req.user_id, "User id is required")?;
    let title = required_field(req.title, "Title is required")?;

    let (latitude, longitude) = match (req.latitude, req.longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(ApiError::BadRequest(
                "Latitude and longitude are required".to_string(),
            ))
        }
    };
    validate_coordinates(latitude, longitude)?;

    let duration = req.duration.unwrap_or(0);
    if duration < 0 {
        return Err(ApiError::BadRequest(
            "Duration must be non-negative".to_string(),
        ));
    }

    let supplied_emotion = req.emotion.filter(|e| !e.trim().is_empty());
    let (emotion, confidence, analysis) = match supplied_emotion {
        Some(emotion) => {
            let confidence = req.emotion_confidence.unwrap_or(0.0).clamp(0.0, 1.0);
            (emotion, confidence, None)
        }
        None => {
            let text = req
                .content
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .or(req.description.as_deref())
                .unwrap_or(title.as_str());
            let analysis = state.glm.analyze_emotion(text).await;
            (
                analysis.primary_emotion.clone(),
                analysis.confidence,
                Some(analysis),
            )
        }
    };

    let mut memory = Memory::new(user_id, title, emotion, confidence, latitude, longitude);
    memory.description = req.description;
    memory.content = req.content;
    memory.audio_data = req.audio_data;
    memory.audio_url = req.audio_url;
    memory.location_name = req.location_name;
    memory.duration = duration;
    memory.access_type = req.access_type.unwrap_or_default();

    db::memories::save_memory(&state.db, &memory).await?;

    info!(
        memory_id = %memory.id,
        emotion = %memory.emotion,
        access_type = %memory.access_type,
        "Memory created"
    );

    // Reload so the response carries the database-assigned timestamp
    let memory = db::memories::load_memory(&state.db, memory.id)
        .await?
        .unwrap_or(memory);

    Ok(Json(CreateMemoryResponse { memory, analysis }))
}

/// Shared core of both nearby variants. Radius arrives in meters and is
/// converted to kilometers for the great-circle filter.
async fn nearby(
    state: &AppState,
    latitude: f64,
    longitude: f64,
    radius_m: Option<f64>,
) -> ApiResult<Json<NearbyResponse>> {
    validate_coordinates(latitude, longitude)?;

    let radius_m = match radius_m {
        Some(radius) if radius > 0.0 => radius,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "Radius must be positive".to_string(),
            ))
        }
        None => db::settings::get_nearby_default_radius_m(&state.db).await?,
    };

    let limit = db::settings::get_nearby_result_limit(&state.db).await?;

    let data =
        db::memories::nearby_memories(&state.db, latitude, longitude, radius_m / 1000.0, limit)
            .await?;

    Ok(Json(NearbyResponse { data }))
}

/// GET /api/memories/nearby/:lat/:lng?radius=<meters>
///
/// Radius defaults to 5000 meters when omitted.
pub async fn nearby_memories_by_path(
    State(state): State<AppState>,
    Path((lat, lng)): Path<(f64, f64)>,
    Query(params): Query<NearbyParams>,
) -> ApiResult<Json<NearbyResponse>> {
    nearby(&state, lat, lng, params.radius).await
}

/// GET /api/memories/nearby?lat=&lng=&radius=<meters>
///
/// Query-string variant; 400 when lat/lng are missing.
pub async fn nearby_memories_by_query(
    State(state): State<AppState>,
    Query(params): Query<NearbyQueryParams>,
) -> ApiResult<Json<NearbyResponse>> {
    let (lat, lng) = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(ApiError::BadRequest(
                "Latitude and longitude required".to_string(),
            ))
        }
    };

    nearby(&state, lat, lng, params.radius).await
}

/// GET /api/memories/:id
pub async fn get_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MemoryResponse>> {
    let memory = db::memories::load_memory(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".to_string()))?;

    Ok(Json(MemoryResponse { memory }))
}

/// GET /api/memories/user/:user_id
pub async fn get_user_memories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<MemoriesResponse>> {
    let memories = db::memories::user_memories(&state.db, &user_id).await?;
    Ok(Json(MemoriesResponse { memories }))
}

/// PUT /api/memories/:id
///
/// Edits the mutable fields only (title, description, emotion, access type),
/// scoped to the owning user.
pub async fn update_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMemoryRequest>,
) -> ApiResult<Json<MemoryResponse>> {
    let user_id = required_field(req.user_id, "User id is required")?;

    let update = MemoryUpdate {
        title: req.title,
        description: req.description,
        emotion: req.emotion,
        access_type: req.access_type,
    };

    let memory = db::memories::update_memory(&state.db, id, &user_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".to_string()))?;

    Ok(Json(MemoryResponse { memory }))
}

/// DELETE /api/memories/:id?userId=
pub async fn delete_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteMemoryParams>,
) -> ApiResult<Json<DeleteMemoryResponse>> {
    let user_id = required_field(params.user_id, "User id is required")?;

    let deleted = db::memories::delete_memory(&state.db, id, &user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Memory not found".to_string()));
    }

    Ok(Json(DeleteMemoryResponse { success: true }))
}

/// POST /api/memories/:id/unlock
///
/// Records that a user unlocked the memory, with an optional echo response.
/// Bumps the unlock counter and wakes the memory.
pub async fn unlock_memory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UnlockMemoryRequest>,
) -> ApiResult<Json<UnlockResponse>> {
    let unlocked_by = required_field(req.unlocked_by, "Unlocking user id is required")?;

    let memory = db::memories::load_memory(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Memory not found".to_string()))?;

    let mut unlock = MemoryUnlock::new(memory.id, unlocked_by);
    unlock.echo_content = req.echo_content;
    unlock.echo_audio_url = req.echo_audio_url;

    db::unlocks::unlock_memory(&state.db, &unlock).await?;

    info!(memory_id = %memory.id, unlocked_by = %unlock.unlocked_by, "Memory unlocked");

    Ok(Json(UnlockResponse { unlock }))
}

/// GET /api/memories/:id/unlocks
pub async fn get_memory_unlocks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UnlocksResponse>> {
    let unlocks = db::unlocks::memory_unlocks(&state.db, id).await?;
    Ok(Json(UnlocksResponse { unlocks }))
}

/// Build memory routes
pub fn memory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/memories", post(create_memory))
        .route("/api/memories/nearby", get(nearby_memories_by_query))
        .route("/api/memories/nearby/:lat/:lng", get(nearby_memories_by_path))
        .route("/api/memories/user/:user_id", get(get_user_memories))
        .route(
            "/api/memories/:id",
            get(get_memory).put(update_memory).delete(delete_memory),
        )
        .route("/api/memories/:id/unlock", post(unlock_memory))
        .route("/api/memories/:id/unlocks", get(get_memory_unlocks))
}
