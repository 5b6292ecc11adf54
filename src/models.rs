//! Authors, articles, and the search services declared over them.
//!
//! The [`Catalog`] is built once per process. Schema provisioning reads the
//! index and projection definitions from it; searches and refreshes go
//! through its two services.

use trigram_search_core::{
    ColumnRef, ConfigurationError, FuzzySearchService, IndexSpec, MaterializedProjection,
    MaterializedSearchService, SearchOptions,
};
use uuid::Uuid;

pub const AUTHORS: &str = "authors";
pub const ARTICLES: &str = "articles";
pub const ARTICLES_SEARCH_VIEW: &str = "articles_search_view";

/// Authors joined with their articles; authors without articles appear
/// once with null article columns.
pub const ARTICLES_SEARCH_VIEW_QUERY: &str = "SELECT authors.username, authors.first_name, \
     authors.last_name, articles.title, articles.body \
     FROM authors LEFT OUTER JOIN articles ON authors.id = articles.author_id";

#[derive(Debug, Clone)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Author {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            first_name: None,
            last_name: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Article {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: Option<String>,
}

impl Article {
    pub fn new(author_id: Uuid, title: impl Into<String>, body: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: title.into(),
            body,
        }
    }
}

/// The search services of this application.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Fuzzy search on article title and body.
    pub articles: FuzzySearchService,
    /// Fuzzy search on authors joined with their articles.
    pub full: MaterializedSearchService,
}

impl Catalog {
    /// `similarity_threshold` is the default pushed into sessions when a
    /// search does not name one.
    pub fn new(similarity_threshold: Option<f64>) -> Result<Self, ConfigurationError> {
        let articles = FuzzySearchService::new(
            &[
                ColumnRef::new(ARTICLES, "title"),
                ColumnRef::new(ARTICLES, "body"),
            ],
            SearchOptions {
                similarity_threshold,
                index: IndexSpec::Derived,
            },
        )?;

        let full = MaterializedSearchService::new(
            articles_search_view()?,
            SearchOptions {
                similarity_threshold,
                index: IndexSpec::Derived,
            },
        )?;

        Ok(Self { articles, full })
    }
}

pub fn articles_search_view() -> Result<MaterializedProjection, ConfigurationError> {
    MaterializedProjection::new(
        ARTICLES_SEARCH_VIEW,
        ARTICLES_SEARCH_VIEW_QUERY,
        ["username", "first_name", "last_name", "title", "body"],
    )
}
