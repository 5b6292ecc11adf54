//! Declarative trigram index definitions.
//!
//! An [`IndexDefinition`] describes a GIN index over a
//! [`SimilarityExpression`] using the `gin_trgm_ops` operator class. It is
//! never created from here: schema provisioning executes
//! [`IndexDefinition::create_sql`] when it sees fit.

use crate::error::ConfigurationError;
use crate::expression::{quote_ident, SimilarityExpression};

/// Index access method for trigram indexes.
pub const TRIGRAM_METHOD: &str = "gin";
/// Operator class for trigram indexes.
pub const TRIGRAM_OPS: &str = "gin_trgm_ops";

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1).
const MAX_IDENT_BYTES: usize = 63;

/// Whether and how a service declares its trigram index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IndexSpec {
    /// No index is declared.
    #[default]
    None,
    /// Declare an index with a name derived from the relation.
    Derived,
    /// Declare an index with this exact name.
    Named(String),
}

/// Description of a trigram index, consumed by schema provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    name: String,
    relation: String,
    expression: SimilarityExpression,
}

impl IndexDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn expression(&self) -> &SimilarityExpression {
        &self.expression
    }

    pub fn method(&self) -> &'static str {
        TRIGRAM_METHOD
    }

    pub fn operator_class(&self) -> &'static str {
        TRIGRAM_OPS
    }

    pub fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} USING {} (({}) {})",
            quote_ident(&self.name),
            quote_ident(&self.relation),
            TRIGRAM_METHOD,
            self.expression.sql(),
            TRIGRAM_OPS,
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP INDEX IF EXISTS {}", quote_ident(&self.name))
    }
}

/// Builder for [`IndexDefinition`]s.
pub struct SimilarityIndex;

impl SimilarityIndex {
    /// Declare a trigram index over `expression`.
    ///
    /// Without a `name`, one is derived as `ix__<relation>__<columns>`.
    pub fn build(
        expression: &SimilarityExpression,
        name: Option<&str>,
    ) -> Result<IndexDefinition, ConfigurationError> {
        let relation = expression.relation()?.to_string();

        let name = match name {
            Some(n) if n.trim().is_empty() => {
                return Err(ConfigurationError::EmptyName { kind: "index" })
            }
            Some(n) => n.to_string(),
            None => derive_name(&relation, expression),
        };

        Ok(IndexDefinition {
            name: truncate_ident(name),
            relation,
            expression: expression.clone(),
        })
    }

    /// Name used for the index of a materialized projection.
    pub fn projection_index_name(projection: &str) -> String {
        truncate_ident(format!("{projection}_trgm_idx"))
    }
}

fn derive_name(relation: &str, expression: &SimilarityExpression) -> String {
    let columns: Vec<&str> = expression.columns().iter().map(|c| c.name.as_str()).collect();
    format!("ix__{}__{}", relation, columns.join("_"))
}

fn truncate_ident(mut ident: String) -> String {
    if ident.len() > MAX_IDENT_BYTES {
        let mut cut = MAX_IDENT_BYTES;
        while !ident.is_char_boundary(cut) {
            cut -= 1;
        }
        ident.truncate(cut);
    }
    ident
}
