use anyhow::Result;
use uuid::Uuid;

use trigram_search_core::SearchSession;

use crate::config::Config;
use crate::db;
use crate::models::{Article, Author, Catalog};
use crate::pg_session::PgSession;

/// Stage and flush an author. With `refresh`, the full-search view is
/// refreshed on the same session so the author is searchable on return.
pub async fn run_add_author(
    config: &Config,
    catalog: &Catalog,
    author: &Author,
    refresh: bool,
) -> Result<Uuid> {
    let pool = db::connect(config).await?;
    let mut session = PgSession::acquire(&pool).await?;

    session.add_author(author);
    finish(&mut session, catalog, refresh).await?;

    session.close();
    pool.close().await;
    println!("author {} ({})", author.id, author.username);
    Ok(author.id)
}

pub async fn run_add_article(
    config: &Config,
    catalog: &Catalog,
    article: &Article,
    refresh: bool,
) -> Result<Uuid> {
    let pool = db::connect(config).await?;
    let mut session = PgSession::acquire(&pool).await?;

    session.add_article(article);
    finish(&mut session, catalog, refresh).await?;

    session.close();
    pool.close().await;
    println!("article {} ({})", article.id, article.title);
    Ok(article.id)
}

async fn finish(session: &mut PgSession, catalog: &Catalog, refresh: bool) -> Result<()> {
    if refresh {
        // refresh() flushes first
        catalog.full.refresh(session, false).await?;
    } else {
        session.flush().await?;
    }
    Ok(())
}
