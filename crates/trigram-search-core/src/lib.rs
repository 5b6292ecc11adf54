//! # Trigram Search Core
//!
//! Store-agnostic logic for trigram (pg_trgm style) fuzzy search: the
//! null-safe column expression, declarative index definitions, query
//! construction with similarity ranking, and refresh coordination for
//! materialized projections.
//!
//! This crate contains no sqlx, tokio, or other I/O dependencies. Queries
//! are built here as descriptions and executed elsewhere through the
//! [`session::SearchSession`] trait.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`expression`] | Concatenated, coalesced column expression |
//! | [`index`] | Trigram index definitions for schema provisioning |
//! | [`query`] | Immutable search query descriptions and result rows |
//! | [`service`] | Single-relation fuzzy search service |
//! | [`projection`] | Materialized projection definitions |
//! | [`materialized`] | Search over a materialized projection plus refresh |
//! | [`session`] | Store session trait and the in-memory implementation |
//! | [`trigram`] | Trigram extraction and similarity scoring |
//! | [`error`] | Error taxonomy |

pub mod error;
pub mod expression;
pub mod index;
pub mod materialized;
pub mod projection;
pub mod query;
pub mod service;
pub mod session;
pub mod trigram;

pub use error::{ConfigurationError, SearchError, StoreError};
pub use expression::{ColumnRef, SimilarityExpression};
pub use index::{IndexDefinition, IndexSpec, SimilarityIndex};
pub use materialized::MaterializedSearchService;
pub use projection::MaterializedProjection;
pub use query::{SearchQuery, SearchRow};
pub use service::{FuzzySearchService, SearchOptions};
pub use session::SearchSession;
