//! PostgreSQL-backed [`SearchSession`].
//!
//! A [`PgSession`] owns one pooled connection, so session-scoped settings
//! (`set_limit`) stay with it until it is dropped. Pools built with
//! [`db::pool_options`](crate::db::pool_options) reset them on release.
//!
//! Writes are staged in a pending buffer and written in one transaction by
//! [`flush`](SearchSession::flush), which also runs before every fetch.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use trigram_search_core::projection::refresh_sql;
use trigram_search_core::query::{RECORD_COLUMN, SCORE_COLUMN};
use trigram_search_core::{SearchQuery, SearchRow, SearchSession, StoreError};

use crate::models::{Article, Author};

const INSERT_AUTHOR: &str =
    "INSERT INTO authors (id, username, first_name, last_name) VALUES ($1, $2, $3, $4)";
const INSERT_ARTICLE: &str =
    "INSERT INTO articles (id, title, body, author_id) VALUES ($1, $2, $3, $4)";

#[derive(Debug, Clone)]
enum BindValue {
    Uuid(Uuid),
    Text(Option<String>),
}

#[derive(Debug, Clone)]
struct PendingWrite {
    sql: &'static str,
    binds: Vec<BindValue>,
}

pub struct PgSession {
    conn: PoolConnection<Postgres>,
    pending: Vec<PendingWrite>,
}

impl PgSession {
    pub async fn acquire(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let conn = pool.acquire().await?;
        Ok(Self {
            conn,
            pending: Vec::new(),
        })
    }

    /// Stage an author insert.
    pub fn add_author(&mut self, author: &Author) {
        self.pending.push(PendingWrite {
            sql: INSERT_AUTHOR,
            binds: vec![
                BindValue::Uuid(author.id),
                BindValue::Text(Some(author.username.clone())),
                BindValue::Text(author.first_name.clone()),
                BindValue::Text(author.last_name.clone()),
            ],
        });
    }

    /// Stage an article insert.
    pub fn add_article(&mut self, article: &Article) {
        self.pending.push(PendingWrite {
            sql: INSERT_ARTICLE,
            binds: vec![
                BindValue::Uuid(article.id),
                BindValue::Text(Some(article.title.clone())),
                BindValue::Text(article.body.clone()),
                BindValue::Uuid(article.author_id),
            ],
        });
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Raw access to the session's connection.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Release the connection back to the pool, discarding unflushed writes.
    /// The pool resets the similarity threshold on the way back.
    pub fn close(self) {
        if !self.pending.is_empty() {
            debug!(discarded = self.pending.len(), "closing session with pending writes");
        }
    }
}

fn decode_row(row: &PgRow, include_score: bool) -> Result<SearchRow, sqlx::Error> {
    let record: serde_json::Value = row.try_get(RECORD_COLUMN)?;
    let similarity = if include_score {
        let score: f32 = row.try_get(SCORE_COLUMN)?;
        Some(f64::from(score))
    } else {
        None
    };
    Ok(SearchRow { record, similarity })
}

#[async_trait]
impl SearchSession for PgSession {
    async fn flush(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut tx = self.conn.begin().await.map_err(StoreError::new)?;
        for write in &self.pending {
            let mut query = sqlx::query(write.sql);
            for bind in &write.binds {
                query = match bind {
                    BindValue::Uuid(id) => query.bind(*id),
                    BindValue::Text(text) => query.bind(text.clone()),
                };
            }
            query.execute(&mut *tx).await.map_err(StoreError::new)?;
        }
        tx.commit().await.map_err(StoreError::new)?;

        debug!(writes = self.pending.len(), "flushed pending writes");
        self.pending.clear();
        Ok(())
    }

    async fn set_similarity_threshold(&mut self, value: f64) -> Result<(), StoreError> {
        // set_limit takes a real
        sqlx::query("SELECT set_limit($1)")
            .bind(value as f32)
            .execute(&mut *self.conn)
            .await
            .map_err(StoreError::new)?;
        Ok(())
    }

    async fn refresh_materialized(
        &mut self,
        name: &str,
        concurrently: bool,
    ) -> Result<(), StoreError> {
        let sql = refresh_sql(name, concurrently);
        sqlx::query(&sql)
            .execute(&mut *self.conn)
            .await
            .map_err(StoreError::new)?;
        Ok(())
    }

    async fn fetch(&mut self, query: &SearchQuery) -> Result<Vec<SearchRow>, StoreError> {
        self.flush().await?;

        let sql = query.to_sql();
        let mut q = sqlx::query(&sql).bind(query.term());
        if let Some(limit) = query.limit() {
            q = q.bind(i64::from(limit));
        }
        let rows = q
            .fetch_all(&mut *self.conn)
            .await
            .map_err(StoreError::new)?;

        rows.iter()
            .map(|row| decode_row(row, query.includes_score()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::new)
    }
}
