//! Materialized projections: named, stored results of a join query.
//!
//! A [`MaterializedProjection`] only describes the view. Creating and
//! dropping its backing storage belongs to schema provisioning, which runs
//! [`create_sql`](MaterializedProjection::create_sql) and friends. At
//! runtime the projection is only ever refreshed, always as a full rebuild,
//! with the statement from [`refresh_sql`].

use crate::error::ConfigurationError;
use crate::expression::{quote_ident, ColumnRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedProjection {
    name: String,
    definition: String,
    columns: Vec<String>,
    unique_key: Vec<String>,
}

impl MaterializedProjection {
    /// Describe a projection named `name` over `definition`, a read query
    /// whose output columns are exactly `columns`, in order.
    pub fn new<I, S>(
        name: impl Into<String>,
        definition: impl Into<String>,
        columns: I,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName { kind: "projection" });
        }
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(ConfigurationError::NoColumns);
        }
        Ok(Self {
            name,
            definition: definition.into(),
            columns,
            unique_key: Vec::new(),
        })
    }

    /// Declare a unique index over `columns`, the precondition PostgreSQL
    /// imposes on `REFRESH MATERIALIZED VIEW CONCURRENTLY`.
    pub fn with_unique_key<I, S>(mut self, columns: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key: Vec<String> = columns.into_iter().map(Into::into).collect();
        if key.is_empty() {
            return Err(ConfigurationError::NoColumns);
        }
        if let Some(unknown) = key.iter().find(|k| !self.columns.contains(k)) {
            return Err(ConfigurationError::UnknownColumn {
                projection: self.name.clone(),
                column: unknown.clone(),
            });
        }
        self.unique_key = key;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn unique_key(&self) -> &[String] {
        &self.unique_key
    }

    pub fn has_unique_key(&self) -> bool {
        !self.unique_key.is_empty()
    }

    /// All columns as references on this projection, in definition order.
    pub fn columns(&self) -> Vec<ColumnRef> {
        self.columns
            .iter()
            .map(|c| ColumnRef::new(self.name.as_str(), c.as_str()))
            .collect()
    }

    pub fn create_sql(&self) -> String {
        format!(
            "CREATE MATERIALIZED VIEW IF NOT EXISTS {} AS {}",
            quote_ident(&self.name),
            self.definition.trim()
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP MATERIALIZED VIEW IF EXISTS {}", quote_ident(&self.name))
    }

    pub fn unique_index_sql(&self) -> Option<String> {
        if self.unique_key.is_empty() {
            return None;
        }
        let cols: Vec<String> = self.unique_key.iter().map(|c| quote_ident(c)).collect();
        Some(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&format!("{}_unique_idx", self.name)),
            quote_ident(&self.name),
            cols.join(", ")
        ))
    }
}

/// `REFRESH MATERIALIZED VIEW [CONCURRENTLY] "<name>"`.
pub fn refresh_sql(name: &str, concurrently: bool) -> String {
    format!(
        "REFRESH MATERIALIZED VIEW {}{}",
        if concurrently { "CONCURRENTLY " } else { "" },
        quote_ident(name)
    )
}
