use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use tracing::debug;

use crate::config::Config;

/// Session-scoped settings changed through a [`PgSession`](crate::pg_session::PgSession).
/// They are reset whenever a connection goes back to the pool.
const RESET_SESSION_SETTINGS: &str = "RESET pg_trgm.similarity_threshold";

/// Create a connection pool to the configured database.
pub async fn connect(config: &Config) -> Result<PgPool> {
    connect_url(&config.db.url, config.db.max_connections).await
}

pub async fn connect_url(url: &str, max_connections: u32) -> Result<PgPool> {
    debug!(max_connections, "connecting to postgres");
    let pool = pool_options(max_connections)
        .connect(url)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

/// Pool options used for every pool handing out [`PgSession`](crate::pg_session::PgSession)s.
///
/// A released connection has its session settings reset, so a threshold set
/// by one session is never seen by the next session on that connection.
pub fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .after_release(|conn, _meta| {
            Box::pin(async move {
                conn.execute(RESET_SESSION_SETTINGS).await?;
                Ok(true)
            })
        })
}
