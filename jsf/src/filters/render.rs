//! SQL rendering for predicate trees
//!
//! Produces a parameterized boolean expression plus the bound values in
//! left-to-right traversal order. Placeholders come from the dialect, so the
//! same tree renders as `A = ?` for SQLite and `A = $1` for PostgreSQL.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sql::{Backend, SqlDialect};

use super::types::{CompareOp, Comparison, Predicate};

/// How negated comparisons treat SQL NULL
///
/// Under three-valued logic `col <> 'x'` is never true for a NULL column.
/// `IncludeNull` widens `$ne`/`$notin` so NULL rows also match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullPolicy {
    #[default]
    Strict,
    IncludeNull,
}

impl NullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::IncludeNull => "include-null",
        }
    }

    /// Parse a policy from a CLI/env string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "include-null" | "include_null" => Ok(Self::IncludeNull),
            _ => Err(format!(
                "Invalid null policy '{}'. Valid options: strict, include-null",
                s
            )),
        }
    }
}

impl fmt::Display for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects SQL parameters during rendering (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SqlParams {
    pub values: Vec<Value>,
}

impl SqlParams {
    /// Record a value and return its placeholder
    fn bind(&mut self, dialect: &dyn SqlDialect, value: &Value) -> String {
        self.values.push(value.clone());
        dialect.placeholder(self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rendered SQL with its bound arguments
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SqlFragment {
    pub sql: String,
    #[serde(rename = "args")]
    pub params: SqlParams,
}

/// Renders predicate trees for one SQL dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlRenderer {
    backend: Backend,
    null_policy: NullPolicy,
    quote_identifiers: bool,
}

impl SqlRenderer {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    /// Quote field names through the dialect instead of emitting them verbatim
    pub fn with_quoted_identifiers(mut self, quote_identifiers: bool) -> Self {
        self.quote_identifiers = quote_identifiers;
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn null_policy(&self) -> NullPolicy {
        self.null_policy
    }

    /// Render a whole tree with fresh parameter numbering
    pub fn render(&self, predicate: &Predicate) -> SqlFragment {
        let mut params = SqlParams::default();
        let sql = predicate.to_sql(self, &mut params);
        SqlFragment { sql, params }
    }

    fn dialect(&self) -> &'static dyn SqlDialect {
        self.backend.dialect()
    }

    fn column(&self, field: &str) -> String {
        if self.quote_identifiers {
            self.dialect().quote_identifier(field)
        } else {
            field.to_string()
        }
    }

    /// Apply the null policy to an already rendered negation
    fn negation(&self, sql: String, col: &str) -> String {
        match self.null_policy {
            NullPolicy::Strict => sql,
            NullPolicy::IncludeNull => format!("({} OR {} IS NULL)", sql, col),
        }
    }
}

impl Predicate {
    /// Generate SQL boolean expression
    /// Returns the SQL with dialect placeholders and appends bound values to params
    pub fn to_sql(&self, renderer: &SqlRenderer, params: &mut SqlParams) -> String {
        match self {
            Self::Comparison(comparison) => comparison.to_sql(renderer, params),
            Self::Conjunction(children) => join(children, " AND ", "(1=1)", renderer, params),
            Self::Disjunction(children) => join(children, " OR ", "(1=0)", renderer, params),
        }
    }
}

fn join(
    children: &[Predicate],
    separator: &str,
    when_empty: &str,
    renderer: &SqlRenderer,
    params: &mut SqlParams,
) -> String {
    if children.is_empty() {
        return when_empty.to_string();
    }
    let parts: Vec<String> = children
        .iter()
        .map(|child| child.to_sql(renderer, params))
        .collect();
    format!("({})", parts.join(separator))
}

impl Comparison {
    /// Generate SQL for a single leaf
    pub fn to_sql(&self, renderer: &SqlRenderer, params: &mut SqlParams) -> String {
        let col = renderer.column(self.field());
        let dialect = renderer.dialect();
        let values = self.operand().values();

        match self.operator() {
            CompareOp::IsNull => format!("{} IS NULL", col),
            CompareOp::IsNotNull => format!("{} IS NOT NULL", col),
            CompareOp::Eq | CompareOp::Ne if values.first().is_none_or(Value::is_null) => {
                if self.operator() == CompareOp::Eq {
                    format!("{} IS NULL", col)
                } else {
                    format!("{} IS NOT NULL", col)
                }
            }
            CompareOp::Ne => {
                let sql = format!(
                    "{} {} {}",
                    col,
                    sql_operator(CompareOp::Ne),
                    params.bind(dialect, &values[0])
                );
                renderer.negation(sql, &col)
            }
            CompareOp::In => {
                if values.is_empty() {
                    return "(1=0)".to_string();
                }
                format!("{} IN ({})", col, bind_all(values, dialect, params))
            }
            CompareOp::NotIn => {
                if values.is_empty() {
                    return "(1=1)".to_string();
                }
                let sql = format!("{} NOT IN ({})", col, bind_all(values, dialect, params));
                renderer.negation(sql, &col)
            }
            op @ (CompareOp::Eq | CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte) => {
                let value = values.first().unwrap_or(&Value::Null);
                format!("{} {} {}", col, sql_operator(op), params.bind(dialect, value))
            }
        }
    }
}

fn sql_operator(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Gte => ">=",
        CompareOp::Lt => "<",
        CompareOp::Lte => "<=",
        CompareOp::IsNull => "IS NULL",
        CompareOp::IsNotNull => "IS NOT NULL",
        CompareOp::In => "IN",
        CompareOp::NotIn => "NOT IN",
    }
}

fn bind_all(values: &[Value], dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
    values
        .iter()
        .map(|value| params.bind(dialect, value))
        .collect::<Vec<_>>()
        .join(",")
}
