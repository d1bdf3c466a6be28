//! Configuration resolution for echo-api
//!
//! Multi-tier GLM API key resolution with Database → ENV → TOML priority.

use echo_common::config::TomlConfig;
use echo_common::Result;
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Resolve the GLM API key from 3-tier configuration
///
/// Priority: Database → ENV → TOML. A missing key is not fatal: the service
/// runs and every analysis degrades to the keyword fallback until a key is
/// configured (the settings endpoint can add one at runtime).
pub async fn resolve_glm_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_key = crate::db::settings::get_glm_api_key(db).await?;
    let env_key = std::env::var("ECHO_GLM_API_KEY").ok();
    let toml_key = toml_config.glm_api_key.clone();

    let sources: Vec<&str> = [
        ("database", &db_key),
        ("environment", &env_key),
        ("TOML", &toml_key),
    ]
    .iter()
    .filter(|(_, key)| key.as_deref().is_some_and(is_valid_key))
    .map(|(name, _)| *name)
    .collect();

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "GLM API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, key) in [
        ("database", db_key),
        ("environment variable", env_key),
        ("TOML config", toml_key),
    ] {
        if let Some(key) = key {
            if is_valid_key(&key) {
                info!("GLM API key loaded from {}", source);
                return Ok(Some(key));
            }
        }
    }

    warn!(
        "GLM API key not configured; emotion analysis will use the keyword fallback. \
         Configure via POST /api/settings/glm_api_key, ECHO_GLM_API_KEY, or the config file."
    );
    Ok(None)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
