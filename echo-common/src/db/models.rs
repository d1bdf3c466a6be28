//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Visibility policy attached to a memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    #[default]
    Public,
    Friends,
    EmotionMatch,
    Private,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Public => "public",
            AccessType::Friends => "friends",
            AccessType::EmotionMatch => "emotion_match",
            AccessType::Private => "private",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(AccessType::Public),
            "friends" => Ok(AccessType::Friends),
            "emotion_match" => Ok(AccessType::EmotionMatch),
            "private" => Ok(AccessType::Private),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown access type: {}",
                other
            ))),
        }
    }
}

/// A voice-tagged, geotagged emotional memory
///
/// Immutable once created except for title/description/emotion/access-type
/// edits, the unlock counter, and the unlock-state flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: Uuid,
    /// Creator's user id
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Voice transcript or free text content
    pub content: Option<String>,
    /// Base64-encoded audio payload
    pub audio_data: Option<String>,
    pub audio_url: Option<String>,
    /// Classified emotion label, never empty
    pub emotion: String,
    /// Classifier confidence, clamped to [0, 1]
    pub emotion_confidence: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    /// Audio duration in seconds
    pub duration: i64,
    pub access_type: AccessType,
    /// 1 = sleeping, 2 = unlocked
    pub is_active: i64,
    pub unlock_count: i64,
    pub created_at: Option<String>,
}

impl Memory {
    /// Create a new sleeping memory with a fresh id
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        title: String,
        emotion: String,
        emotion_confidence: f64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description: None,
            content: None,
            audio_data: None,
            audio_url: None,
            emotion,
            emotion_confidence: emotion_confidence.clamp(0.0, 1.0),
            latitude,
            longitude,
            location_name: None,
            duration: 0,
            access_type: AccessType::Public,
            is_active: 1,
            unlock_count: 0,
            created_at: None,
        }
    }
}

/// Record of one user unlocking another user's memory, with an optional
/// echo response. Insert-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUnlock {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub unlocked_by: String,
    pub echo_content: Option<String>,
    pub echo_audio_url: Option<String>,
    pub unlocked_at: Option<String>,
}

impl MemoryUnlock {
    pub fn new(memory_id: Uuid, unlocked_by: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            memory_id,
            unlocked_by,
            echo_content: None,
            echo_audio_url: None,
            unlocked_at: None,
        }
    }
}

/// Aggregated per-emotion row for the global emotion map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionMapPoint {
    pub emotion: String,
    pub count: i64,
    pub lat: f64,
    pub lng: f64,
}

/// A memory returned by the nearby query together with its computed
/// great-circle distance from the query point
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyMemory {
    #[serde(flatten)]
    pub memory: Memory,
    pub distance_km: f64,
}
