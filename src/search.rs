use anyhow::Result;
use clap::ValueEnum;
use tracing::info;

use trigram_search_core::{SearchQuery, SearchRow, SearchSession};

use crate::config::Config;
use crate::db;
use crate::models::Catalog;
use crate::pg_session::PgSession;

/// Which service a search goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchTarget {
    /// Article title and body.
    Articles,
    /// Authors joined with articles (materialized view).
    Full,
}

#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub term: String,
    pub target: SearchTarget,
    pub threshold: Option<f64>,
    pub limit: Option<u32>,
    pub order: bool,
    pub include_score: bool,
}

/// Build the query for `args` and set the session threshold it relies on.
pub async fn prepare_query(
    session: &mut PgSession,
    catalog: &Catalog,
    args: &SearchArgs,
) -> Result<SearchQuery> {
    let query = match args.target {
        SearchTarget::Articles => {
            catalog
                .articles
                .set_similarity_threshold(session, args.threshold)
                .await?;
            catalog
                .articles
                .search(&args.term, args.order, args.include_score)
        }
        SearchTarget::Full => {
            catalog
                .full
                .set_similarity_threshold(session, args.threshold)
                .await?;
            catalog
                .full
                .search(&args.term, args.order, args.include_score)
        }
    };
    Ok(query)
}

pub async fn search_rows(
    config: &Config,
    catalog: &Catalog,
    args: &SearchArgs,
) -> Result<Vec<SearchRow>> {
    if args.term.trim().is_empty() {
        return Ok(Vec::new());
    }

    let pool = db::connect(config).await?;
    let mut session = PgSession::acquire(&pool).await?;

    let query = prepare_query(&mut session, catalog, args)
        .await?
        .with_limit(args.limit.unwrap_or(config.search.limit));
    let rows = session.fetch(&query).await?;

    session.close();
    pool.close().await;
    Ok(rows)
}

pub async fn run_search(config: &Config, catalog: &Catalog, args: &SearchArgs) -> Result<()> {
    let rows = search_rows(config, catalog, args).await?;

    if rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, row) in rows.iter().enumerate() {
        match row.similarity {
            Some(score) => println!("{}. [{:.3}]", i + 1, score),
            None => println!("{}.", i + 1),
        }
        if let Some(fields) = row.record.as_object() {
            for (column, value) in fields {
                let shown = match value {
                    serde_json::Value::Null => continue,
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                println!("    {column}: {shown}");
            }
        }
        println!();
    }

    Ok(())
}

/// Refresh the full-search projection in a fresh session.
pub async fn run_refresh(config: &Config, catalog: &Catalog, concurrently: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut session = PgSession::acquire(&pool).await?;

    catalog.full.refresh(&mut session, concurrently).await?;

    session.close();
    pool.close().await;

    let name = catalog.full.projection().name();
    info!(projection = name, concurrently, "refresh complete");
    println!("refreshed {name}");
    Ok(())
}
