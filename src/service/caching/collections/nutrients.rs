use redis::AsyncCommands;

use crate::models::NutrientFacts;
use crate::service::caching::{CacheError, RedisCache};

const NUTRIENTS_TTL_SECS: u64 = 60 * 60 * 24 * 30; // 30 days

fn nutrients_key(label: &str) -> String {
    format!("foodi:nutrients:{}", normalize_label(label))
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Cached facts for a classifier label, if any.
pub async fn load(cache: &RedisCache, label: &str) -> Result<Option<NutrientFacts>, CacheError> {
    let mut conn = cache.connection();
    let stored: Option<String> = conn.get(nutrients_key(label)).await?;
    match stored {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn store(
    cache: &RedisCache,
    label: &str,
    facts: &NutrientFacts,
) -> Result<(), CacheError> {
    let mut conn = cache.connection();
    let raw = serde_json::to_string(facts)?;
    conn.set_ex::<_, _, ()>(nutrients_key(label), raw, NUTRIENTS_TTL_SECS)
        .await?;
    Ok(())
}
