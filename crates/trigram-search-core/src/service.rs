//! Fuzzy search over the text columns of a single relation.
//!
//! [`FuzzySearchService`] is built once and reused for the life of the
//! process. It validates its column set up front, optionally declares a
//! trigram index, and builds [`SearchQuery`] values on demand.
//!
//! The similarity threshold used by `%` lives in the database session, not
//! in the service. [`FuzzySearchService::set_similarity_threshold`] pushes
//! it into a session explicitly; it has to be called again on every new
//! session that needs a non-default threshold.

use tracing::debug;

use crate::error::{ConfigurationError, SearchError};
use crate::expression::{ColumnRef, SimilarityExpression};
use crate::index::{IndexDefinition, IndexSpec, SimilarityIndex};
use crate::query::SearchQuery;
use crate::session::SearchSession;

/// Construction options shared by both search services.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Default threshold for [`FuzzySearchService::set_similarity_threshold`].
    pub similarity_threshold: Option<f64>,
    /// Trigram index declaration.
    pub index: IndexSpec,
}

#[derive(Debug, Clone)]
pub struct FuzzySearchService {
    relation: String,
    expression: SimilarityExpression,
    similarity_threshold: Option<f64>,
    index: Option<IndexDefinition>,
}

impl FuzzySearchService {
    /// Build a service over `columns`, which must all belong to one relation.
    pub fn new(columns: &[ColumnRef], options: SearchOptions) -> Result<Self, ConfigurationError> {
        let expression = SimilarityExpression::build(columns)?;
        let relation = expression.relation()?.to_string();

        let similarity_threshold = options
            .similarity_threshold
            .map(validate_threshold)
            .transpose()?;

        let index = match &options.index {
            IndexSpec::None => None,
            IndexSpec::Derived => Some(SimilarityIndex::build(&expression, None)?),
            IndexSpec::Named(name) => Some(SimilarityIndex::build(&expression, Some(name))?),
        };

        Ok(Self {
            relation,
            expression,
            similarity_threshold,
            index,
        })
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn columns(&self) -> &[ColumnRef] {
        self.expression.columns()
    }

    pub fn expression(&self) -> &SimilarityExpression {
        &self.expression
    }

    pub fn index(&self) -> Option<&IndexDefinition> {
        self.index.as_ref()
    }

    pub fn similarity_threshold(&self) -> Option<f64> {
        self.similarity_threshold
    }

    /// Set the session's trigram similarity threshold to `value`, or to the
    /// configured default when `value` is `None`.
    pub async fn set_similarity_threshold<S>(
        &self,
        session: &mut S,
        value: Option<f64>,
    ) -> Result<(), SearchError>
    where
        S: SearchSession + ?Sized,
    {
        let value = value
            .or(self.similarity_threshold)
            .ok_or(ConfigurationError::MissingThreshold)?;
        let value = validate_threshold(value)?;

        debug!(relation = %self.relation, value, "setting session similarity threshold");
        session.set_similarity_threshold(value).await?;
        Ok(())
    }

    /// Build a query for rows similar to `term`.
    ///
    /// With `order`, rows come back by descending similarity. With
    /// `include_score`, each row carries its similarity score.
    pub fn search(&self, term: &str, order: bool, include_score: bool) -> SearchQuery {
        debug!(relation = %self.relation, order, include_score, "building search query");
        SearchQuery::new(&self.relation, &self.expression, term, order, include_score)
    }
}

pub(crate) fn validate_threshold(value: f64) -> Result<f64, ConfigurationError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::InvalidThreshold(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::MemoryStore;

    fn article_columns() -> Vec<ColumnRef> {
        vec![
            ColumnRef::new("articles", "title"),
            ColumnRef::new("articles", "body"),
        ]
    }

    #[test]
    fn test_single_relation_accepted() {
        let service = FuzzySearchService::new(&article_columns(), SearchOptions::default()).unwrap();
        assert_eq!(service.relation(), "articles");
        assert_eq!(service.columns().len(), 2);
        assert!(service.index().is_none());
    }

    #[test]
    fn test_multiple_relations_rejected() {
        let columns = vec![
            ColumnRef::new("articles", "title"),
            ColumnRef::new("authors", "username"),
        ];
        let err = FuzzySearchService::new(&columns, SearchOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigurationError::MultipleRelations { .. }));
        assert!(err.to_string().contains("only one relation supported"));
    }

    #[test]
    fn test_no_columns_rejected() {
        let err = FuzzySearchService::new(&[], SearchOptions::default()).unwrap_err();
        assert_eq!(err, ConfigurationError::NoColumns);
    }

    #[test]
    fn test_invalid_default_threshold_rejected() {
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let options = SearchOptions {
                similarity_threshold: Some(bad),
                ..Default::default()
            };
            assert!(FuzzySearchService::new(&article_columns(), options).is_err());
        }
    }

    #[test]
    fn test_derived_index() {
        let options = SearchOptions {
            index: IndexSpec::Derived,
            ..Default::default()
        };
        let service = FuzzySearchService::new(&article_columns(), options).unwrap();
        let index = service.index().unwrap();
        assert_eq!(index.name(), "ix__articles__title_body");
        assert_eq!(index.expression(), service.expression());
    }

    #[test]
    fn test_query_uses_index_expression() {
        let options = SearchOptions {
            index: IndexSpec::Named("articles_trgm".to_string()),
            ..Default::default()
        };
        let service = FuzzySearchService::new(&article_columns(), options).unwrap();
        let query = service.search("search", true, true);
        let index_sql = service.index().unwrap().create_sql();
        assert!(index_sql.contains(query.expression().sql()));
        assert!(query.to_sql().contains(service.expression().sql()));
    }

    #[test]
    fn test_search_flags() {
        let service = FuzzySearchService::new(&article_columns(), SearchOptions::default()).unwrap();
        let query = service.search("term", false, true);
        assert_eq!(query.relation(), "articles");
        assert_eq!(query.term(), "term");
        assert!(!query.is_ordered());
        assert!(query.includes_score());
    }

    #[tokio::test]
    async fn test_set_threshold_without_value_or_default() {
        let store = MemoryStore::new();
        let mut session = store.session();
        let service = FuzzySearchService::new(&article_columns(), SearchOptions::default()).unwrap();

        let err = service
            .set_similarity_threshold(&mut session, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Configuration(ConfigurationError::MissingThreshold)
        ));
        assert!((session.similarity_threshold() - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_set_threshold_uses_default_then_override() {
        let store = MemoryStore::new();
        let mut session = store.session();
        let options = SearchOptions {
            similarity_threshold: Some(0.01),
            ..Default::default()
        };
        let service = FuzzySearchService::new(&article_columns(), options).unwrap();

        service
            .set_similarity_threshold(&mut session, None)
            .await
            .unwrap();
        assert!((session.similarity_threshold() - 0.01).abs() < 1e-9);

        service
            .set_similarity_threshold(&mut session, Some(0.5))
            .await
            .unwrap();
        assert!((session.similarity_threshold() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_set_threshold_out_of_range() {
        let store = MemoryStore::new();
        let mut session = store.session();
        let service = FuzzySearchService::new(&article_columns(), SearchOptions::default()).unwrap();
        let err = service
            .set_similarity_threshold(&mut session, Some(2.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Configuration(ConfigurationError::InvalidThreshold(_))
        ));
    }
}
