//! Settings database operations
//!
//! Get/set accessors for the settings table following the key-value pattern.

use echo_common::Result;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Get GLM API key from database
///
/// Returns Some(key) if exists, None if not set
pub async fn get_glm_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "glm_api_key").await
}

/// Set GLM API key in database
pub async fn set_glm_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, "glm_api_key", key).await
}

/// Get minimum interval between outbound GLM requests
///
/// Default: 2000 ms
pub async fn get_glm_rate_limit_ms(db: &Pool<Sqlite>) -> Result<u64> {
    get_setting(db, "glm_rate_limit_ms")
        .await
        .map(|opt| opt.unwrap_or(2000))
}

/// Get default nearby-search radius in meters
///
/// Default: 5000 m
pub async fn get_nearby_default_radius_m(db: &Pool<Sqlite>) -> Result<f64> {
    get_setting(db, "nearby_default_radius_m")
        .await
        .map(|opt| opt.unwrap_or(5000.0))
}

/// Get maximum number of nearby-search results
///
/// Default: 50
pub async fn get_nearby_result_limit(db: &Pool<Sqlite>) -> Result<i64> {
    get_setting(db, "nearby_result_limit")
        .await
        .map(|opt| opt.unwrap_or(50))
}

/// Get a typed setting value, None when missing or unparsable
async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?
        .flatten();

    Ok(value.and_then(|v| v.parse().ok()))
}

/// Upsert a setting value
async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}
