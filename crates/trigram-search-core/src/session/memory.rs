//! In-memory [`SearchSession`] implementation for tests and examples.
//!
//! [`MemoryStore`] is a shared handle over base relations and materialized
//! views (`HashMap`s behind `std::sync::RwLock`). Each [`MemorySession`]
//! has its own pending-write buffer and similarity threshold, like a real
//! database session. Views are rebuilt by running a Rust closure over the
//! base relations; their rows only change on refresh.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::error::StoreError;
use crate::projection::MaterializedProjection;
use crate::query::{SearchQuery, SearchRow};
use crate::trigram::{similarity, DEFAULT_SIMILARITY_THRESHOLD};

use super::SearchSession;

/// A row: column name to nullable text value.
pub type Record = BTreeMap<String, Option<String>>;

/// Base relations by name, as seen by view definitions.
pub type Relations = HashMap<String, Vec<Record>>;

type Definition = Arc<dyn Fn(&Relations) -> Vec<Record> + Send + Sync>;

/// Build a [`Record`] from `(column, value)` pairs.
pub fn record<'a, I>(pairs: I) -> Record
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect()
}

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("relation \"{0}\" does not exist")]
    UnknownRelation(String),
    #[error("materialized view \"{0}\" does not exist")]
    UnknownView(String),
    #[error("cannot refresh materialized view \"{0}\" concurrently: create a unique index with no WHERE clause on one or more columns of the materialized view")]
    MissingUniqueIndex(String),
}

struct View {
    definition: Definition,
    rows: Vec<Record>,
    unique_index: bool,
}

#[derive(Default)]
struct State {
    relations: Relations,
    views: HashMap<String, View>,
}

/// Shared in-memory database. Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty base relation. Existing rows are kept.
    pub fn create_relation(&self, name: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.relations.entry(name.to_string()).or_default();
    }

    /// Provision storage for `projection`, populated immediately from
    /// `definition`. A unique index exists iff the projection declares a
    /// unique key.
    pub fn create_projection<F>(&self, projection: &MaterializedProjection, definition: F)
    where
        F: Fn(&Relations) -> Vec<Record> + Send + Sync + 'static,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let rows = definition(&state.relations);
        state.views.insert(
            projection.name().to_string(),
            View {
                definition: Arc::new(definition),
                rows,
                unique_index: projection.has_unique_key(),
            },
        );
    }

    /// Current committed rows of a relation or view.
    pub fn rows(&self, name: &str) -> Option<Vec<Record>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .relations
            .get(name)
            .or_else(|| state.views.get(name).map(|v| &v.rows))
            .cloned()
    }

    pub fn session(&self) -> MemorySession {
        MemorySession {
            store: self.clone(),
            pending: Vec::new(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// One logical session over a [`MemoryStore`].
pub struct MemorySession {
    store: MemoryStore,
    pending: Vec<(String, Record)>,
    threshold: f64,
}

impl MemorySession {
    /// Stage an insert. Nothing is visible to other sessions until flushed.
    pub fn add(&mut self, relation: &str, row: Record) {
        self.pending.push((relation.to_string(), row));
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.threshold
    }
}

fn to_json(row: &Record) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = row
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Some(s) => serde_json::Value::String(s.clone()),
                None => serde_json::Value::Null,
            };
            (k.clone(), value)
        })
        .collect();
    serde_json::Value::Object(map)
}

#[async_trait]
impl SearchSession for MemorySession {
    async fn flush(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut state = self.store.state.write().unwrap_or_else(PoisonError::into_inner);

        // All or nothing: reject the batch before applying any of it.
        if let Some((relation, _)) = self
            .pending
            .iter()
            .find(|(relation, _)| !state.relations.contains_key(relation))
        {
            return Err(StoreError::new(MemoryStoreError::UnknownRelation(
                relation.clone(),
            )));
        }
        for (relation, row) in self.pending.drain(..) {
            state.relations.entry(relation).or_default().push(row);
        }
        Ok(())
    }

    async fn set_similarity_threshold(&mut self, value: f64) -> Result<(), StoreError> {
        self.threshold = value;
        Ok(())
    }

    async fn refresh_materialized(
        &mut self,
        name: &str,
        concurrently: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.store.state.write().unwrap_or_else(PoisonError::into_inner);
        let State { relations, views } = &mut *state;

        let view = views
            .get_mut(name)
            .ok_or_else(|| StoreError::new(MemoryStoreError::UnknownView(name.to_string())))?;
        if concurrently && !view.unique_index {
            return Err(StoreError::new(MemoryStoreError::MissingUniqueIndex(
                name.to_string(),
            )));
        }
        view.rows = (view.definition)(relations);
        Ok(())
    }

    async fn fetch(&mut self, query: &SearchQuery) -> Result<Vec<SearchRow>, StoreError> {
        // Queries autoflush, as an ORM session would.
        self.flush().await?;

        let state = self.store.state.read().unwrap_or_else(PoisonError::into_inner);
        let rows = state
            .relations
            .get(query.relation())
            .or_else(|| state.views.get(query.relation()).map(|v| &v.rows))
            .ok_or_else(|| {
                StoreError::new(MemoryStoreError::UnknownRelation(
                    query.relation().to_string(),
                ))
            })?;

        let mut matches: Vec<(f64, &Record)> = rows
            .iter()
            .filter_map(|row| {
                let text = query
                    .expression()
                    .evaluate(|col| row.get(col).and_then(|v| v.as_deref()));
                let score = similarity(&text, query.term());
                (score >= self.threshold).then_some((score, row))
            })
            .collect();

        if query.is_ordered() {
            // Stable: ties keep insertion order.
            matches.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        }
        if let Some(limit) = query.limit() {
            matches.truncate(limit as usize);
        }

        Ok(matches
            .into_iter()
            .map(|(score, row)| SearchRow {
                record: to_json(row),
                similarity: query.includes_score().then_some(score),
            })
            .collect())
    }
}
