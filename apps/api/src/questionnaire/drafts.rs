//! Draft slot: one raw answer snapshot per user, so an unfinished
//! questionnaire survives a reload or a switch of device.

use async_trait::async_trait;
use redis::Client as RedisClient;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

/// Drafts expire after 30 days of inactivity.
const DRAFT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Option<String>, AppError>;
    async fn save(&self, user_id: Uuid, raw: &str) -> Result<(), AppError>;
    async fn clear(&self, user_id: Uuid) -> Result<(), AppError>;
}

/// Redis-backed draft slot (`compliance:draft:<user_id>`).
pub struct RedisDraftStore {
    client: RedisClient,
}

impl RedisDraftStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn key(user_id: Uuid) -> String {
        format!("compliance:draft:{user_id}")
    }
}

#[async_trait]
impl DraftStore for RedisDraftStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(user_id))
            .query_async(&mut conn)
            .await?;
        Ok(raw)
    }

    async fn save(&self, user_id: Uuid, raw: &str) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(user_id))
            .arg(raw)
            .arg("EX")
            .arg(DRAFT_TTL_SECS)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!("Saved questionnaire draft for user {user_id}");
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL")
            .arg(Self::key(user_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
