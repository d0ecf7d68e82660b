//! Select query builder that compiled filters attach to

use crate::filters::{FilterCompiler, FilterError, Predicate, SqlFragment, SqlParams, SqlRenderer};

/// Minimal `SELECT ... FROM ... WHERE ...` builder
///
/// Conditions are AND-ed in the order they were attached. Empty predicates
/// are never attached, so a no-op filter leaves the rendered SQL unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    columns: Vec<String>,
    table: Option<String>,
    conditions: Vec<Predicate>,
}

impl SelectQuery {
    /// Start a query selecting the given columns (`*` when empty)
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Attach a WHERE condition unless the predicate is empty
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.attach(predicate);
        self
    }

    /// Compile raw filter bytes and attach the result
    ///
    /// On error the query is left exactly as it was.
    pub fn apply_filter(
        &mut self,
        compiler: &FilterCompiler,
        raw: &[u8],
    ) -> Result<(), FilterError> {
        let predicate = compiler.compile(raw)?;
        self.attach(predicate);
        Ok(())
    }

    pub fn conditions(&self) -> &[Predicate] {
        &self.conditions
    }

    fn attach(&mut self, predicate: Predicate) {
        if predicate.is_empty() {
            tracing::trace!("Skipping empty filter");
            return;
        }
        self.conditions.push(predicate);
    }

    /// Render the full statement with bound arguments
    pub fn to_sql(&self, renderer: &SqlRenderer) -> SqlFragment {
        let mut params = SqlParams::default();

        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {}", columns);

        if let Some(table) = &self.table {
            sql.push_str(" FROM ");
            sql.push_str(table);
        }

        if !self.conditions.is_empty() {
            let parts: Vec<String> = self
                .conditions
                .iter()
                .map(|condition| condition.to_sql(renderer, &mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        SqlFragment { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{NullPolicy, compile};
    use crate::sql::Backend;
    use serde_json::json;

    fn query() -> SelectQuery {
        SelectQuery::new(["*"]).from("db")
    }

    #[test]
    fn test_no_filter() {
        let mut q = query();
        q.apply_filter(&FilterCompiler::default(), b"").unwrap();

        let fragment = q.to_sql(&SqlRenderer::default());
        assert_eq!(fragment.sql, "SELECT * FROM db");
        assert!(fragment.params.is_empty());
        assert!(q.conditions().is_empty());
    }

    #[test]
    fn test_empty_array_attaches_nothing() {
        let q = query().filter(compile(b"[]").unwrap());
        assert_eq!(q.to_sql(&SqlRenderer::default()).sql, "SELECT * FROM db");
    }

    #[test]
    fn test_equals() {
        let mut q = query();
        q.apply_filter(&FilterCompiler::default(), br#"[{"MovieName":{"$eq":"Godzilla"}}]"#)
            .unwrap();

        let fragment = q.to_sql(&SqlRenderer::default());
        assert_eq!(fragment.sql, "SELECT * FROM db WHERE (MovieName = ?)");
        assert_eq!(fragment.params.values, vec![json!("Godzilla")]);
    }

    #[test]
    fn test_not_equals_include_null() {
        let mut q = query();
        q.apply_filter(
            &FilterCompiler::default(),
            br#"[{"MovieName":{"$ne":"Godzilla"}}]"#,
        )
        .unwrap();

        let renderer = SqlRenderer::default().with_null_policy(NullPolicy::IncludeNull);
        let fragment = q.to_sql(&renderer);
        assert_eq!(
            fragment.sql,
            "SELECT * FROM db WHERE ((MovieName <> ? OR MovieName IS NULL))"
        );
        assert_eq!(fragment.params.values, vec![json!("Godzilla")]);
    }

    #[test]
    fn test_in() {
        let mut q = query();
        q.apply_filter(
            &FilterCompiler::default(),
            br#"[{"MovieName":{"$in":["Godzilla","King Kong vs. Godzilla"]}}]"#,
        )
        .unwrap();

        let fragment = q.to_sql(&SqlRenderer::default());
        assert_eq!(fragment.sql, "SELECT * FROM db WHERE (MovieName IN (?,?))");
        assert_eq!(
            fragment.params.values,
            vec![json!("Godzilla"), json!("King Kong vs. Godzilla")]
        );
    }

    #[test]
    fn test_failed_filter_leaves_query_unmodified() {
        let compiler = FilterCompiler::default();
        let mut q = SelectQuery::new(["MovieName", "Rating"]).from("db");
        q.apply_filter(&compiler, br#"[{"Rating":{"$eq":"PG"}}]"#)
            .unwrap();
        let before = q.clone();

        let failures: [&[u8]; 4] = [
            b"{oops",
            br#"{"Rating":{"$eq":"PG"}}"#,
            br#"[{"Rating":"PG"}]"#,
            br#"[{"$or":[{"A":{"$eq":1}},{"$and":[{"B":{"$foo":2}}]}]}]"#,
        ];
        for raw in failures {
            assert!(q.apply_filter(&compiler, raw).is_err());
            assert_eq!(q, before);
        }

        assert_eq!(
            q.to_sql(&SqlRenderer::default()).sql,
            "SELECT MovieName, Rating FROM db WHERE (Rating = ?)"
        );
    }

    #[test]
    fn test_multiple_filters_are_anded_with_continuous_numbering() {
        let compiler = FilterCompiler::default();
        let mut q = SelectQuery::new(["id"]).from("movies");
        q.apply_filter(&compiler, br#"[{"A":{"$eq":1}}]"#).unwrap();
        q.apply_filter(&compiler, br#"[{"$or":[{"B":{"$eq":2}},{"C":{"$in":[3,4]}}]}]"#)
            .unwrap();

        let fragment = q.to_sql(&SqlRenderer::new(Backend::Postgres));
        assert_eq!(
            fragment.sql,
            "SELECT id FROM movies WHERE (A = $1) AND ((B = $2 OR C IN ($3,$4)))"
        );
        assert_eq!(
            fragment.params.values,
            vec![json!(1), json!(2), json!(3), json!(4)]
        );
    }

    #[test]
    fn test_select_without_table_or_columns() {
        let q = SelectQuery::new(Vec::<String>::new());
        assert_eq!(q.to_sql(&SqlRenderer::default()).sql, "SELECT *");
    }
}
