use chrono::Utc;
use redis::{AsyncCommands, Client as RedisClient, RedisResult};

use crate::errors::AuthError;

pub const ACCESS_DENY_PREFIX: &str = "access_deny";
pub const REFRESH_DENY_PREFIX: &str = "refresh_deny";

/// Revoked-token store. Without Redis every operation is a no-op and
/// logout is stateless.
#[derive(Clone, Default)]
pub struct TokenDenylist {
    client: Option<RedisClient>,
}

impl TokenDenylist {
    pub fn new(redis_url: Option<&str>) -> Self {
        let client = redis_url.and_then(|url| {
            RedisClient::open(url)
                .map_err(|e| tracing::error!("Redis connection error: {}", e))
                .ok()
        });
        TokenDenylist { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Denies `token` until its own expiry (`exp`, unix seconds).
    pub async fn revoke(&self, prefix: &str, token: &str, exp: usize) -> Result<(), AuthError> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        let now = Utc::now().timestamp().max(0) as usize;
        if exp <= now {
            return Ok(());
        }

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(format!("{}:{}", prefix, token), 1u8, (exp - now) as u64)
            .await?;
        Ok(())
    }

    pub async fn is_revoked(&self, prefix: &str, token: &str) -> Result<bool, AuthError> {
        let Some(client) = &self.client else {
            return Ok(false);
        };
        let mut conn = client.get_multiplexed_async_connection().await?;
        let exists: bool = conn.exists(format!("{}:{}", prefix, token)).await?;
        Ok(exists)
    }

    /// "OK", "Unavailable" or "Not configured", for the health report.
    pub async fn status(&self) -> &'static str {
        let Some(client) = &self.client else {
            return "Not configured";
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let pong: RedisResult<String> = conn.ping().await;
                match pong {
                    Ok(p) if p == "PONG" => "OK",
                    _ => "Unavailable",
                }
            }
            Err(_) => "Unavailable",
        }
    }
}
