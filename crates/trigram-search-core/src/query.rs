//! Search query descriptions and result rows.
//!
//! A [`SearchQuery`] is an immutable value: "rows of `relation` whose
//! similarity expression is similar to `term`". It does not run anything;
//! a [`SearchSession`](crate::session::SearchSession) executes it.
//!
//! # Rendered SQL
//!
//! ```text
//! SELECT to_jsonb("rel".*) AS record [, similarity(<expr>, $1) AS similarity_ratio]
//! FROM "rel"
//! WHERE (<expr>) % $1
//! [ORDER BY similarity(<expr>, $1) DESC]
//! [LIMIT $2]
//! ```
//!
//! `%` matches when the similarity is at least the session's threshold
//! (`pg_trgm.similarity_threshold`, 0.3 unless changed). Ties in the
//! ordering fall back to the store's natural row order.

use crate::expression::{quote_ident, SimilarityExpression};

/// Output column holding the whole row as a JSON object.
pub const RECORD_COLUMN: &str = "record";
/// Output column holding the similarity score.
pub const SCORE_COLUMN: &str = "similarity_ratio";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    relation: String,
    expression: SimilarityExpression,
    term: String,
    order: bool,
    include_score: bool,
    limit: Option<u32>,
}

impl SearchQuery {
    pub(crate) fn new(
        relation: &str,
        expression: &SimilarityExpression,
        term: &str,
        order: bool,
        include_score: bool,
    ) -> Self {
        Self {
            relation: relation.to_string(),
            expression: expression.clone(),
            term: term.to_string(),
            order,
            include_score,
            limit: None,
        }
    }

    /// Same query, returning at most `limit` rows.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn expression(&self) -> &SimilarityExpression {
        &self.expression
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_ordered(&self) -> bool {
        self.order
    }

    pub fn includes_score(&self) -> bool {
        self.include_score
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Render as PostgreSQL. Bind [`term`](Self::term) as `$1` and, when set,
    /// [`limit`](Self::limit) as `$2`.
    pub fn to_sql(&self) -> String {
        let rel = quote_ident(&self.relation);
        let expr = self.expression.sql();

        let mut sql = format!("SELECT to_jsonb({rel}.*) AS {RECORD_COLUMN}");
        if self.include_score {
            sql.push_str(&format!(", similarity({expr}, $1) AS {SCORE_COLUMN}"));
        }
        sql.push_str(&format!(" FROM {rel} WHERE ({expr}) % $1"));
        if self.order {
            sql.push_str(&format!(" ORDER BY similarity({expr}, $1) DESC"));
        }
        if self.limit.is_some() {
            sql.push_str(" LIMIT $2");
        }
        sql
    }
}

/// One matching row.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    /// The row's columns as a JSON object.
    pub record: serde_json::Value,
    /// Present when the query was built with `include_score`.
    pub similarity: Option<f64>,
}

impl SearchRow {
    /// A text column of the row, if present and non-null.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.record.get(column)?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ColumnRef;

    fn query(order: bool, include_score: bool) -> SearchQuery {
        let expr = SimilarityExpression::build(&[
            ColumnRef::new("articles", "title"),
            ColumnRef::new("articles", "body"),
        ])
        .unwrap();
        SearchQuery::new("articles", &expr, "postgres", order, include_score)
    }

    const EXPR: &str = "coalesce(\"title\", '') || coalesce(\"body\", '')";

    #[test]
    fn test_sql_ordered_with_score() {
        let sql = query(true, true).to_sql();
        assert_eq!(
            sql,
            format!(
                "SELECT to_jsonb(\"articles\".*) AS record, similarity({EXPR}, $1) AS similarity_ratio \
                 FROM \"articles\" WHERE ({EXPR}) % $1 ORDER BY similarity({EXPR}, $1) DESC"
            )
        );
    }

    #[test]
    fn test_sql_unordered_without_score() {
        let sql = query(false, false).to_sql();
        assert_eq!(
            sql,
            format!("SELECT to_jsonb(\"articles\".*) AS record FROM \"articles\" WHERE ({EXPR}) % $1")
        );
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains(SCORE_COLUMN));
    }

    #[test]
    fn test_with_limit() {
        let q = query(true, false).with_limit(5);
        assert_eq!(q.limit(), Some(5));
        assert!(q.to_sql().ends_with("DESC LIMIT $2"));
    }

    #[test]
    fn test_term_is_bound_not_inlined() {
        let q = query(true, true);
        assert_eq!(q.term(), "postgres");
        assert!(!q.to_sql().contains("postgres"));
    }

    #[test]
    fn test_row_get() {
        let row = SearchRow {
            record: serde_json::json!({"title": "Imagine", "body": null}),
            similarity: Some(0.5),
        };
        assert_eq!(row.get("title"), Some("Imagine"));
        assert_eq!(row.get("body"), None);
        assert_eq!(row.get("missing"), None);
    }
}
