//! Error types for search construction and execution.
//!
//! - [`ConfigurationError`] is raised while building services, expressions,
//!   indexes, or projections, and when a threshold is requested without a value.
//! - [`StoreError`] wraps whatever the backing store returned, unmodified.
//! - [`SearchError`] is returned by the async service operations.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Invalid search definition or missing configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("similarity expression requires at least one column")]
    NoColumns,
    #[error("only one relation supported, columns span: {}", .relations.join(", "))]
    MultipleRelations { relations: Vec<String> },
    #[error("no similarity threshold given and no default configured")]
    MissingThreshold,
    #[error("similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },
    #[error("column `{column}` is not part of projection `{projection}`")]
    UnknownColumn { projection: String, column: String },
}

/// An error raised by the backing store.
///
/// The original error is kept as-is; use [`StoreError::downcast_ref`] to
/// inspect the driver-specific type.
pub struct StoreError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self { inner: err.into() }
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// Error returned by search service operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Rebuilding a materialized projection failed. Never retried here.
    #[error("refresh of materialized projection `{projection}` failed (concurrently: {concurrently}): {source}")]
    Refresh {
        projection: String,
        concurrently: bool,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SearchError {
    pub fn is_refresh_failure(&self) -> bool {
        matches!(self, SearchError::Refresh { .. })
    }
}
