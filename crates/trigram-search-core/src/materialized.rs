//! Fuzzy search over a materialized projection.
//!
//! [`MaterializedSearchService`] holds a [`FuzzySearchService`] configured
//! on the projection's full column list, plus the projection itself so it
//! can be refreshed. Searching through it is identical to searching a table.
//!
//! The service never refreshes on its own. After writing to the base
//! tables, callers run [`refresh`](MaterializedSearchService::refresh)
//! before searches that must see those writes. Within one session, a
//! search issued after `refresh` observes the refreshed rows; across
//! sessions no ordering is promised.

use tracing::{info, warn};

use crate::error::{ConfigurationError, SearchError};
use crate::expression::ColumnRef;
use crate::index::{IndexDefinition, IndexSpec, SimilarityIndex};
use crate::projection::MaterializedProjection;
use crate::query::SearchQuery;
use crate::service::{FuzzySearchService, SearchOptions};
use crate::session::SearchSession;

#[derive(Debug, Clone)]
pub struct MaterializedSearchService {
    projection: MaterializedProjection,
    search: FuzzySearchService,
}

impl MaterializedSearchService {
    /// Build a service over every column of `projection`.
    ///
    /// [`IndexSpec::Derived`] names the index `<projection>_trgm_idx`.
    pub fn new(
        projection: MaterializedProjection,
        options: SearchOptions,
    ) -> Result<Self, ConfigurationError> {
        let index = match options.index {
            IndexSpec::Derived => {
                IndexSpec::Named(SimilarityIndex::projection_index_name(projection.name()))
            }
            other => other,
        };
        let search = FuzzySearchService::new(
            &projection.columns(),
            SearchOptions {
                similarity_threshold: options.similarity_threshold,
                index,
            },
        )?;
        Ok(Self { projection, search })
    }

    pub fn projection(&self) -> &MaterializedProjection {
        &self.projection
    }

    /// The underlying single-relation service.
    pub fn search_service(&self) -> &FuzzySearchService {
        &self.search
    }

    pub fn columns(&self) -> &[ColumnRef] {
        self.search.columns()
    }

    pub fn index(&self) -> Option<&IndexDefinition> {
        self.search.index()
    }

    pub async fn set_similarity_threshold<S>(
        &self,
        session: &mut S,
        value: Option<f64>,
    ) -> Result<(), SearchError>
    where
        S: SearchSession + ?Sized,
    {
        self.search.set_similarity_threshold(session, value).await
    }

    pub fn search(&self, term: &str, order: bool, include_score: bool) -> SearchQuery {
        self.search.search(term, order, include_score)
    }

    /// Flush the session's pending writes, then rebuild the projection.
    ///
    /// With `concurrently`, readers of the current rows are not blocked;
    /// the store requires a unique index on the projection for that and
    /// the refresh fails if it is missing. Failures come back as
    /// [`SearchError::Refresh`] and are not retried.
    pub async fn refresh<S>(&self, session: &mut S, concurrently: bool) -> Result<(), SearchError>
    where
        S: SearchSession + ?Sized,
    {
        // Refreshing before the flush would read stale base tables.
        session.flush().await?;

        let name = self.projection.name();
        info!(projection = name, concurrently, "refreshing materialized projection");

        session
            .refresh_materialized(name, concurrently)
            .await
            .map_err(|source| {
                warn!(projection = name, concurrently, error = %source, "refresh failed");
                SearchError::Refresh {
                    projection: name.to_string(),
                    concurrently,
                    source,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> MaterializedProjection {
        MaterializedProjection::new(
            "articles_search_view",
            "SELECT username, title FROM authors JOIN articles ON authors.id = articles.author_id",
            ["username", "title"],
        )
        .unwrap()
    }

    #[test]
    fn test_columns_from_projection() {
        let service = MaterializedSearchService::new(projection(), SearchOptions::default()).unwrap();
        let names: Vec<&str> = service.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["username", "title"]);
        assert_eq!(service.search_service().relation(), "articles_search_view");
    }

    #[test]
    fn test_derived_index_uses_projection_name() {
        let options = SearchOptions {
            index: IndexSpec::Derived,
            ..Default::default()
        };
        let service = MaterializedSearchService::new(projection(), options).unwrap();
        assert_eq!(
            service.index().unwrap().name(),
            "articles_search_view_trgm_idx"
        );
    }

    #[test]
    fn test_explicit_index_name_kept() {
        let options = SearchOptions {
            index: IndexSpec::Named("custom_idx".to_string()),
            ..Default::default()
        };
        let service = MaterializedSearchService::new(projection(), options).unwrap();
        assert_eq!(service.index().unwrap().name(), "custom_idx");
    }

    #[test]
    fn test_search_targets_projection() {
        let service = MaterializedSearchService::new(projection(), SearchOptions::default()).unwrap();
        let query = service.search("vybornyy", true, true);
        assert_eq!(query.relation(), "articles_search_view");
        assert!(query.to_sql().contains("FROM \"articles_search_view\""));
    }
}
