//! SQL abstraction layer for multi-database support
//!
//! Rendered filters differ between backends only in placeholder syntax and
//! identifier quoting; everything else is plain ANSI SQL.

mod clickhouse_dialect;
mod dialect;
mod duckdb_dialect;
mod postgres_dialect;
mod sqlite_dialect;

use serde::{Deserialize, Serialize};

pub use clickhouse_dialect::ClickhouseDialect;
pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Postgres,
    Duckdb,
    Clickhouse,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
            Backend::Duckdb => &DuckdbDialect,
            Backend::Clickhouse => &ClickhouseDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::Duckdb => "duckdb",
            Backend::Clickhouse => "clickhouse",
        }
    }

    /// Parse a backend from a CLI/env string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "duckdb" => Ok(Backend::Duckdb),
            "clickhouse" => Ok(Backend::Clickhouse),
            _ => Err(format!(
                "Invalid dialect '{}'. Valid options: sqlite, postgres, duckdb, clickhouse",
                s
            )),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
