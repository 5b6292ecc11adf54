//! The store session seam.
//!
//! A [`SearchSession`] is one logical database session: a single ordered
//! sequence of operations on one connection. Session-scoped state (the
//! similarity threshold) lives there and nowhere else, so every operation
//! that depends on it takes the session as an explicit argument.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`flush`](SearchSession::flush) | Write buffered pending writes |
//! | [`set_similarity_threshold`](SearchSession::set_similarity_threshold) | Session-scoped `%` threshold |
//! | [`refresh_materialized`](SearchSession::refresh_materialized) | Rebuild one materialized view |
//! | [`fetch`](SearchSession::fetch) | Execute a [`SearchQuery`] |
//!
//! Implementations return store errors wrapped, not translated.

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::{SearchQuery, SearchRow};

#[async_trait]
pub trait SearchSession: Send {
    async fn flush(&mut self) -> Result<(), StoreError>;

    async fn set_similarity_threshold(&mut self, value: f64) -> Result<(), StoreError>;

    async fn refresh_materialized(&mut self, name: &str, concurrently: bool)
        -> Result<(), StoreError>;

    async fn fetch(&mut self, query: &SearchQuery) -> Result<Vec<SearchRow>, StoreError>;
}
