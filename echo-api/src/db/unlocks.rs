//! Memory unlock database operations
//!
//! Unlock records are insert-only. Unlocking also bumps the memory's unlock
//! counter and flips it from sleeping (1) to unlocked (2).

use echo_common::db::MemoryUnlock;
use echo_common::Result;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Record an unlock and update the memory's unlock state
pub async fn unlock_memory(pool: &SqlitePool, unlock: &MemoryUnlock) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO memory_unlocks (
            id, memory_id, unlocked_by, echo_content, echo_audio_url, unlocked_at
        ) VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(unlock.id.to_string())
    .bind(unlock.memory_id.to_string())
    .bind(&unlock.unlocked_by)
    .bind(&unlock.echo_content)
    .bind(&unlock.echo_audio_url)
    .execute(pool)
    .await?;

    sqlx::query(
        "UPDATE memories SET unlock_count = unlock_count + 1, is_active = 2, \
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(unlock.memory_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all unlocks recorded against a memory, oldest first
pub async fn memory_unlocks(pool: &SqlitePool, memory_id: Uuid) -> Result<Vec<MemoryUnlock>> {
    let rows = sqlx::query(
        r#"
        SELECT id, memory_id, unlocked_by, echo_content, echo_audio_url, unlocked_at
        FROM memory_unlocks
        WHERE memory_id = ?
        ORDER BY unlocked_at ASC, id
        "#,
    )
    .bind(memory_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(unlock_from_row).collect()
}

fn unlock_from_row(row: &SqliteRow) -> Result<MemoryUnlock> {
    let id_str: String = row.get("id");
    let memory_id_str: String = row.get("memory_id");

    Ok(MemoryUnlock {
        id: Uuid::parse_str(&id_str).map_err(|e| {
            echo_common::Error::Internal(format!("Invalid unlock id {}: {}", id_str, e))
        })?,
        memory_id: Uuid::parse_str(&memory_id_str).map_err(|e| {
            echo_common::Error::Internal(format!("Invalid memory id {}: {}", memory_id_str, e))
        })?,
        unlocked_by: row.get("unlocked_by"),
        echo_content: row.get("echo_content"),
        echo_audio_url: row.get("echo_audio_url"),
        unlocked_at: row.get("unlocked_at"),
    })
}
