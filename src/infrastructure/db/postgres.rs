use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{info, warn};
use std::{str::FromStr, time::Duration};

use crate::settings::AppConfig;

const MAX_RETRIES: u32 = 5;

/// Connects with exponential backoff. Every connection carries a
/// `statement_timeout`, so no store call can hang indefinitely.
pub async fn create_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let connect_options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", format!("{}ms", config.db_statement_timeout_ms))]);

    let mut retry_count = 0;
    let mut wait_seconds = 2;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout())
            .connect_with(connect_options.clone())
            .await
        {
            Ok(pool) => {
                info!(
                    max_connections = config.db_max_connections,
                    statement_timeout_ms = config.db_statement_timeout_ms,
                    "Database connection established."
                );
                return Ok(pool);
            }
            Err(e) if retry_count < MAX_RETRIES => {
                retry_count += 1;
                warn!(
                    "Failed to connect to database (attempt {}/{}): {}. Retrying in {}s...",
                    retry_count, MAX_RETRIES, e, wait_seconds
                );

                tokio::time::sleep(Duration::from_secs(wait_seconds)).await;
                wait_seconds *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}
