//! Advisory session records: the latest token issued to a user, kept in Redis
//! under `session:<user_id>` for a day. Nothing reads them back to authorize.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write `value` at `key`, replacing any previous value and resetting its expiry.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url).context("open redis client")?;
        info!("redis client configured");
        Ok(Self { client })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("redis connect")?;
        con.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .with_context(|| format!("redis set_ex {}", key))?;
        Ok(())
    }
}

/// Cached payload, field names kept as the cache consumers expect them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Token")]
    pub token: String,
}

pub fn session_key(user_id: i64) -> String {
    format!("session:{}", user_id)
}

pub async fn record_session(store: &dyn SessionStore, user_id: i64, token: &str) -> AppResult<()> {
    let record = SessionRecord {
        id: user_id.to_string(),
        token: token.to_string(),
    };
    let payload =
        serde_json::to_string(&record).map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

    store
        .put(&session_key(user_id), payload, SESSION_TTL)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "session write failed");
            AppError::StoreUnavailable(e.to_string())
        })?;
    debug!(user_id, "session recorded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySessions;

    #[tokio::test]
    async fn writes_record_under_user_key_with_day_ttl() {
        let store = MemorySessions::default();
        record_session(&store, 7, "tok-1").await.unwrap();

        let (value, ttl) = store.get("session:7").expect("record written");
        assert_eq!(ttl, Duration::from_secs(86_400));
        let record: SessionRecord = serde_json::from_str(&value).unwrap();
        assert_eq!(
            record,
            SessionRecord {
                id: "7".into(),
                token: "tok-1".into()
            }
        );
        assert!(value.contains("\"ID\":\"7\""));
        assert!(value.contains("\"Token\":\"tok-1\""));
    }

    #[tokio::test]
    async fn new_login_overwrites_previous_record() {
        let store = MemorySessions::default();
        record_session(&store, 7, "old").await.unwrap();
        record_session(&store, 7, "new").await.unwrap();
        record_session(&store, 8, "other").await.unwrap();

        assert_eq!(store.len(), 2);
        let (value, _) = store.get("session:7").unwrap();
        assert!(value.contains("\"Token\":\"new\""));
    }

    #[tokio::test]
    async fn unreachable_store_is_reported() {
        let store = MemorySessions::unavailable();
        let err = record_session(&store, 1, "tok").await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
