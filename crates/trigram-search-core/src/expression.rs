//! The null-safe concatenated column expression.
//!
//! Every trigram index and every query built against it must use exactly
//! the same expression text, otherwise the planner cannot match the query
//! to the index. [`SimilarityExpression`] is the single place that text
//! is produced.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ConfigurationError;

/// A text-valued column on one table or materialized view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub relation: String,
    pub name: String,
}

impl ColumnRef {
    pub fn new(relation: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.name)
    }
}

/// Quote a PostgreSQL identifier, doubling any embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `coalesce(c1, '') || coalesce(c2, '') || ...` over an ordered column list.
///
/// Column order is preserved. Columns are rendered unqualified so the same
/// text is valid both inside `CREATE INDEX` and in a single-relation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityExpression {
    columns: Vec<ColumnRef>,
    sql: String,
}

impl SimilarityExpression {
    pub fn build(columns: &[ColumnRef]) -> Result<Self, ConfigurationError> {
        if columns.is_empty() {
            return Err(ConfigurationError::NoColumns);
        }

        let sql = columns
            .iter()
            .map(|c| format!("coalesce({}, '')", quote_ident(&c.name)))
            .collect::<Vec<_>>()
            .join(" || ");

        Ok(Self {
            columns: columns.to_vec(),
            sql,
        })
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The single relation all columns belong to.
    pub fn relation(&self) -> Result<&str, ConfigurationError> {
        let relations: BTreeSet<&str> = self.columns.iter().map(|c| c.relation.as_str()).collect();
        if relations.len() > 1 {
            return Err(ConfigurationError::MultipleRelations {
                relations: relations.into_iter().map(str::to_string).collect(),
            });
        }
        // build() rejects empty column lists
        Ok(self.columns[0].relation.as_str())
    }

    /// Evaluate the expression against a row, treating missing or null
    /// values as empty strings.
    pub fn evaluate<'a, F>(&self, mut value_of: F) -> String
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut out = String::new();
        for column in &self.columns {
            if let Some(v) = value_of(&column.name) {
                out.push_str(v);
            }
        }
        out
    }
}

impl fmt::Display for SimilarityExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
