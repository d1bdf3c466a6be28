//! Database initialization
//!
//! Opens (or creates) the ECHO database and applies the schema idempotently.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all ECHO tables and seed default settings
///
/// Idempotent; safe to call multiple times. Also used by tests against
/// in-memory pools.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_memories_table(pool).await?;
    create_memory_unlocks_table(pool).await?;
    create_settings_table(pool).await?;
    init_default_settings(pool).await?;

    info!("Database tables initialized (memories, memory_unlocks, settings)");

    Ok(())
}

async fn create_memories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS memories (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            content TEXT,
            audio_data TEXT,
            audio_url TEXT,
            emotion TEXT NOT NULL,
            emotion_confidence REAL NOT NULL DEFAULT 0,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            location_name TEXT,
            duration INTEGER NOT NULL DEFAULT 0,
            access_type TEXT NOT NULL DEFAULT 'public',
            is_active INTEGER NOT NULL DEFAULT 1,
            unlock_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_memories_user_id ON memories(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_memories_access_type ON memories(access_type)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_memory_unlocks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS memory_unlocks (
            id TEXT PRIMARY KEY,
            memory_id TEXT NOT NULL REFERENCES memories(id),
            unlocked_by TEXT NOT NULL,
            echo_content TEXT,
            echo_audio_url TEXT,
            unlocked_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_memory_unlocks_memory_id ON memory_unlocks(memory_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values. NULL values are
/// reset to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Nearby-query settings
    ensure_setting(pool, "nearby_default_radius_m", "5000").await?;
    ensure_setting(pool, "nearby_result_limit", "50").await?;

    // Classification client settings
    ensure_setting(pool, "glm_rate_limit_ms", "2000").await?;

    Ok(())
}

/// Insert a setting if missing, or reset it to the default when NULL
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        WHERE settings.value IS NULL
        "#,
    )
    .bind(key)
    .bind(default_value)
    .execute(pool)
    .await?;

    Ok(())
}
