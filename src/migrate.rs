use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::models::Catalog;

const CREATE_EXTENSION: &str = "CREATE EXTENSION IF NOT EXISTS pg_trgm";

const CREATE_AUTHORS: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT
)
"#;

const CREATE_ARTICLES: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL,
    body TEXT,
    author_id UUID NOT NULL REFERENCES authors(id)
)
"#;

const CREATE_ARTICLES_AUTHOR_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS ix__articles__author_id ON articles(author_id)";

/// Every statement needed to provision the schema, in execution order.
///
/// The `pg_trgm` extension comes before any trigram index, and the base
/// tables before the materialized view that joins them.
pub fn provisioning_statements(catalog: &Catalog) -> Vec<String> {
    let mut statements = vec![
        CREATE_EXTENSION.to_string(),
        CREATE_AUTHORS.trim().to_string(),
        CREATE_ARTICLES.trim().to_string(),
        CREATE_ARTICLES_AUTHOR_INDEX.to_string(),
    ];

    if let Some(index) = catalog.articles.index() {
        statements.push(index.create_sql());
    }

    let projection = catalog.full.projection();
    statements.push(projection.create_sql());
    if let Some(unique) = projection.unique_index_sql() {
        statements.push(unique);
    }
    if let Some(index) = catalog.full.index() {
        statements.push(index.create_sql());
    }

    statements
}

/// Statements that remove everything [`provisioning_statements`] created,
/// except the extension.
pub fn teardown_statements(catalog: &Catalog) -> Vec<String> {
    vec![
        catalog.full.projection().drop_sql(),
        "DROP TABLE IF EXISTS articles".to_string(),
        "DROP TABLE IF EXISTS authors".to_string(),
    ]
}

pub async fn run_migrations(pool: &PgPool, catalog: &Catalog) -> Result<()> {
    execute_all(pool, &provisioning_statements(catalog)).await?;
    info!(
        projection = catalog.full.projection().name(),
        "schema provisioned"
    );
    Ok(())
}

pub async fn run_teardown(pool: &PgPool, catalog: &Catalog) -> Result<()> {
    execute_all(pool, &teardown_statements(catalog)).await?;
    info!("schema dropped");
    Ok(())
}

async fn execute_all(pool: &PgPool, statements: &[String]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in statements {
        debug!(%statement, "executing");
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {statement}"))?;
    }
    tx.commit().await?;
    Ok(())
}
