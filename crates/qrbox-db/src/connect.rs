//! Connection supervision and schema setup.
//!
//! The service refuses to serve traffic against an unverified store: the
//! pool is established with a capped number of attempts and doubling backoff,
//! and schema migrations run before the listener binds. Exhausting the
//! attempts propagates an error out of main, exiting non-zero.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use qrbox_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Backoff before the next attempt, doubling from 1s: 1s, 2s, 4s, 8s...
/// `attempt` counts completed failed attempts. Capped so a misconfigured
/// attempt count cannot produce absurd waits.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(6))
}

async fn try_connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
}

/// Establish and verify the database pool, retrying with exponential backoff
/// up to `config.db_connect_attempts` attempts.
pub async fn connect_with_retry(config: &Config) -> Result<PgPool> {
    let attempts = config.db_connect_attempts.max(1);

    for attempt in 1..=attempts {
        tracing::info!(attempt, max_attempts = attempts, "Connecting to database");

        match try_connect(config).await {
            Ok(pool) => {
                // The pool connects lazily; a ping proves the store is reachable.
                match ping(&pool).await {
                    Ok(()) => {
                        tracing::info!(
                            max_connections = config.db_max_connections,
                            "Database connected successfully"
                        );
                        return Ok(pool);
                    }
                    Err(e) => {
                        tracing::warn!(attempt, error = %e, "Database ping failed");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Database connection attempt failed");
            }
        }

        if attempt < attempts {
            let delay = backoff_delay(attempt - 1);
            tracing::info!(delay_secs = delay.as_secs(), "Waiting before retry");
            tokio::time::sleep(delay).await;
        }
    }

    anyhow::bail!("Database connection failed after {} attempts", attempts)
}

/// Lightweight connectivity probe.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Whether the expected schema objects are present. Used by the health
/// endpoint, not as a gate (migrations guarantee them at startup).
pub async fn tables_exist(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT to_regclass('public.uploads') IS NOT NULL
            AND to_regclass('public.qr_codes') IS NOT NULL",
    )
    .fetch_one(pool)
    .await
}

/// Apply pending migrations from the workspace migrations/ directory.
/// Every step is written to be idempotent (IF NOT EXISTS, duplicate-object
/// guards), so re-application against an existing schema is a no-op.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_one_second() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_delay(6), Duration::from_secs(64));
        assert_eq!(backoff_delay(20), Duration::from_secs(64));
    }
}
