//! Request quota for plan generation.
//!
//! A fixed number of requests per client key per window. The counter service is
//! injected through `AppState`; `RedisQuota` shares counts across instances and
//! `InMemoryQuota` serves single-instance deployments and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::Client as RedisClient;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed { remaining: u32 },
    Rejected { retry_after_secs: u64 },
}

#[async_trait]
pub trait RequestQuota: Send + Sync {
    /// Counts one request against `key` and decides whether it may proceed.
    async fn try_acquire(&self, key: &str) -> Result<QuotaDecision, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

/// INCR on `compliance:quota:<key>`; the first hit in a window sets the expiry.
pub struct RedisQuota {
    client: RedisClient,
    policy: QuotaPolicy,
}

impl RedisQuota {
    pub fn new(client: RedisClient, policy: QuotaPolicy) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl RequestQuota for RedisQuota {
    async fn try_acquire(&self, key: &str) -> Result<QuotaDecision, AppError> {
        let redis_key = format!("compliance:quota:{key}");
        let window_secs = self.policy.window.as_secs().max(1);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u32 = redis::cmd("INCR")
            .arg(&redis_key)
            .query_async(&mut conn)
            .await?;
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(&redis_key)
                .arg(window_secs)
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        if count > self.policy.limit {
            let ttl: i64 = redis::cmd("TTL")
                .arg(&redis_key)
                .query_async(&mut conn)
                .await?;
            if ttl < 0 {
                // Counter lost its expiry (crash between INCR and EXPIRE); restart the window.
                redis::cmd("EXPIRE")
                    .arg(&redis_key)
                    .arg(window_secs)
                    .query_async::<_, ()>(&mut conn)
                    .await?;
            }
            warn!("Quota exceeded for {key} ({count}/{})", self.policy.limit);
            return Ok(QuotaDecision::Rejected {
                retry_after_secs: if ttl > 0 { ttl as u64 } else { window_secs },
            });
        }

        Ok(QuotaDecision::Allowed {
            remaining: self.policy.limit - count,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

struct Window {
    count: u32,
    resets_at: Instant,
}

pub struct InMemoryQuota {
    policy: QuotaPolicy,
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryQuota {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Drops expired windows. Call periodically.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| w.resets_at > now);
        debug!("Quota cleanup: {} active keys", windows.len());
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[async_trait]
impl RequestQuota for InMemoryQuota {
    async fn try_acquire(&self, key: &str) -> Result<QuotaDecision, AppError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + self.policy.window,
        });
        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = now + self.policy.window;
        }

        if window.count >= self.policy.limit {
            let remaining = window.resets_at.saturating_duration_since(now);
            warn!("Quota exceeded for {key} ({}/{})", window.count, self.policy.limit);
            return Ok(QuotaDecision::Rejected {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        window.count += 1;
        Ok(QuotaDecision::Allowed {
            remaining: self.policy.limit - window.count,
        })
    }
}
