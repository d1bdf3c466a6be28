//! Memory database operations
//!
//! Persistence for memories plus the geospatial nearby query and the
//! emotion-map aggregation.

use echo_common::db::{EmotionMapPoint, Memory, NearbyMemory};
use echo_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

const MEMORY_COLUMNS: &str = "id, user_id, title, description, content, audio_data, audio_url, \
     emotion, emotion_confidence, latitude, longitude, location_name, \
     duration, access_type, is_active, unlock_count, created_at";

/// Fields a memory edit may change. Everything else is immutable after
/// creation.
#[derive(Debug, Default, Clone)]
pub struct MemoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub emotion: Option<String>,
    pub access_type: Option<echo_common::db::AccessType>,
}

/// Save memory to database
pub async fn save_memory(pool: &SqlitePool, memory: &Memory) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO memories (
            id, user_id, title, description, content, audio_data, audio_url,
            emotion, emotion_confidence, latitude, longitude, location_name,
            duration, access_type, is_active, unlock_count, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(memory.id.to_string())
    .bind(&memory.user_id)
    .bind(&memory.title)
    .bind(&memory.description)
    .bind(&memory.content)
    .bind(&memory.audio_data)
    .bind(&memory.audio_url)
    .bind(&memory.emotion)
    .bind(memory.emotion_confidence)
    .bind(memory.latitude)
    .bind(memory.longitude)
    .bind(&memory.location_name)
    .bind(memory.duration)
    .bind(memory.access_type.as_str())
    .bind(memory.is_active)
    .bind(memory.unlock_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load memory by id
pub async fn load_memory(pool: &SqlitePool, id: Uuid) -> Result<Option<Memory>> {
    let sql = format!("SELECT {} FROM memories WHERE id = ?", MEMORY_COLUMNS);

    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|row| memory_from_row(&row)).transpose()
}

/// Load a user's memories, newest first
pub async fn user_memories(pool: &SqlitePool, user_id: &str) -> Result<Vec<Memory>> {
    let sql = format!(
        "SELECT {} FROM memories WHERE user_id = ? ORDER BY created_at DESC, id",
        MEMORY_COLUMNS
    );

    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;

    rows.iter().map(memory_from_row).collect()
}

/// Apply an edit to the mutable fields of a memory, scoped to its owner.
/// Returns the updated memory, or None when no owned memory matched.
pub async fn update_memory(
    pool: &SqlitePool,
    id: Uuid,
    user_id: &str,
    update: &MemoryUpdate,
) -> Result<Option<Memory>> {
    let result = sqlx::query(
        r#"
        UPDATE memories SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            emotion = COALESCE(?, emotion),
            access_type = COALESCE(?, access_type),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&update.title)
    .bind(&update.description)
    .bind(&update.emotion)
    .bind(update.access_type.map(|a| a.as_str()))
    .bind(id.to_string())
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    load_memory(pool, id).await
}

/// Delete a memory, scoped to its owner. Returns whether a row was removed.
pub async fn delete_memory(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<bool> {
    // Unlock records reference the memory row
    sqlx::query(
        "DELETE FROM memory_unlocks WHERE memory_id = ? \
         AND EXISTS (SELECT 1 FROM memories WHERE id = ? AND user_id = ?)",
    )
    .bind(id.to_string())
    .bind(id.to_string())
    .bind(user_id)
    .execute(pool)
    .await?;

    let result = sqlx::query("DELETE FROM memories WHERE id = ? AND user_id = ?")
        .bind(id.to_string())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Public memories within radius_km of the query point, nearest first.
///
/// The great-circle distance (Earth radius 6371 km) is evaluated inside
/// SQLite, so the filter and ordering happen in the query engine. The acos
/// argument is clamped to [-1, 1]: rounding can push it past 1.0 for
/// coincident points, and NaN would silently drop the row.
pub async fn nearby_memories(
    pool: &SqlitePool,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    limit: i64,
) -> Result<Vec<NearbyMemory>> {
    let sql = format!(
        r#"
        SELECT * FROM (
            SELECT {},
                (6371.0 * acos(max(-1.0, min(1.0,
                    cos(radians(?)) * cos(radians(latitude)) *
                    cos(radians(longitude) - radians(?)) +
                    sin(radians(?)) * sin(radians(latitude))
                )))) AS distance_km
            FROM memories
            WHERE access_type = 'public'
        )
        WHERE distance_km <= ?
        ORDER BY distance_km ASC
        LIMIT ?
        "#,
        MEMORY_COLUMNS
    );

    let rows = sqlx::query(&sql)
        .bind(latitude)
        .bind(longitude)
        .bind(latitude)
        .bind(radius_km)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(NearbyMemory {
                memory: memory_from_row(row)?,
                distance_km: row.get("distance_km"),
            })
        })
        .collect()
}

/// Aggregate public memories per emotion with mean coordinates, for the
/// global emotion map
pub async fn emotion_map(pool: &SqlitePool) -> Result<Vec<EmotionMapPoint>> {
    let rows = sqlx::query(
        r#"
        SELECT emotion, COUNT(*) AS count, AVG(latitude) AS lat, AVG(longitude) AS lng
        FROM memories
        WHERE access_type = 'public'
        GROUP BY emotion
        ORDER BY count DESC, emotion
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| EmotionMapPoint {
            emotion: row.get("emotion"),
            count: row.get("count"),
            lat: row.get("lat"),
            lng: row.get("lng"),
        })
        .collect())
}

fn memory_from_row(row: &SqliteRow) -> Result<Memory> {
    let id_str: String = row.get("id");
    let access_str: String = row.get("access_type");

    Ok(Memory {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Invalid memory id {}: {}", id_str, e)))?,
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        audio_data: row.get("audio_data"),
        audio_url: row.get("audio_url"),
        emotion: row.get("emotion"),
        emotion_confidence: row.get("emotion_confidence"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        location_name: row.get("location_name"),
        duration: row.get("duration"),
        access_type: access_str.parse().unwrap_or_default(),
        is_active: row.get("is_active"),
        unlock_count: row.get("unlock_count"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_common::db::AccessType;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        echo_common::db::create_tables(&pool).await.unwrap();
        pool
    }

    fn memory_at(user_id: &str, title: &str, lat: f64, lng: f64) -> Memory {
        let mut memory = Memory::new(
            user_id.to_string(),
            title.to_string(),
            "joy".to_string(),
            0.9,
            lat,
            lng,
        );
        memory.content = Some("test content".to_string());
        memory
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let pool = test_pool().await;

        let mut memory = memory_at("user-1", "First concert", 40.7128, -74.0060);
        memory.description = Some("A night to remember".to_string());
        memory.location_name = Some("New York City".to_string());
        memory.duration = 42;

        save_memory(&pool, &memory).await.expect("save failed");

        let loaded = load_memory(&pool, memory.id)
            .await
            .expect("load failed")
            .expect("memory not found");

        assert_eq!(loaded.id, memory.id);
        assert_eq!(loaded.title, "First concert");
        assert_eq!(loaded.emotion, "joy");
        assert_eq!(loaded.emotion_confidence, 0.9);
        assert_eq!(loaded.duration, 42);
        assert_eq!(loaded.access_type, AccessType::Public);
        assert!(loaded.created_at.is_some());
    }

    #[tokio::test]
    async fn load_missing_memory_returns_none() {
        let pool = test_pool().await;
        let result = load_memory(&pool, Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn user_memories_are_scoped_to_owner() {
        let pool = test_pool().await;

        save_memory(&pool, &memory_at("alice", "One", 1.0, 1.0)).await.unwrap();
        save_memory(&pool, &memory_at("alice", "Two", 2.0, 2.0)).await.unwrap();
        save_memory(&pool, &memory_at("bob", "Other", 3.0, 3.0)).await.unwrap();

        let memories = user_memories(&pool, "alice").await.unwrap();
        assert_eq!(memories.len(), 2);
        assert!(memories.iter().all(|m| m.user_id == "alice"));
    }

    #[tokio::test]
    async fn update_edits_mutable_fields_only_for_owner() {
        let pool = test_pool().await;

        let memory = memory_at("alice", "Original", 10.0, 20.0);
        save_memory(&pool, &memory).await.unwrap();

        let update = MemoryUpdate {
            title: Some("Edited".to_string()),
            access_type: Some(AccessType::Private),
            ..Default::default()
        };

        // Wrong owner: no change
        let denied = update_memory(&pool, memory.id, "mallory", &update).await.unwrap();
        assert!(denied.is_none());

        let updated = update_memory(&pool, memory.id, "alice", &update)
            .await
            .unwrap()
            .expect("update missed");

        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.access_type, AccessType::Private);
        // Untouched fields are preserved
        assert_eq!(updated.emotion, "joy");
        assert_eq!(updated.latitude, 10.0);
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() {
        let pool = test_pool().await;

        let memory = memory_at("alice", "Mine", 0.0, 0.0);
        save_memory(&pool, &memory).await.unwrap();

        assert!(!delete_memory(&pool, memory.id, "bob").await.unwrap());
        assert!(delete_memory(&pool, memory.id, "alice").await.unwrap());
        assert!(load_memory(&pool, memory.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn emotion_map_aggregates_public_memories() {
        let pool = test_pool().await;

        save_memory(&pool, &memory_at("a", "J1", 10.0, 10.0)).await.unwrap();
        save_memory(&pool, &memory_at("b", "J2", 20.0, 20.0)).await.unwrap();

        let mut sad = memory_at("c", "S1", 30.0, 30.0);
        sad.emotion = "sadness".to_string();
        save_memory(&pool, &sad).await.unwrap();

        let mut hidden = memory_at("d", "P1", 40.0, 40.0);
        hidden.access_type = AccessType::Private;
        save_memory(&pool, &hidden).await.unwrap();

        let map = emotion_map(&pool).await.unwrap();
        assert_eq!(map.len(), 2);

        let joy = map.iter().find(|p| p.emotion == "joy").unwrap();
        assert_eq!(joy.count, 2);
        assert!((joy.lat - 15.0).abs() < 1e-9);
        assert!((joy.lng - 15.0).abs() < 1e-9);

        let sadness = map.iter().find(|p| p.emotion == "sadness").unwrap();
        assert_eq!(sadness.count, 1);
    }
}
