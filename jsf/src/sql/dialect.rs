//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for the database-specific pieces of a
//! rendered filter: parameter placeholders and identifier quoting.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Quoted identifiers ("col" vs `col`)
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite/DuckDB: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    /// - ClickHouse: Returns "?"
    fn placeholder(&self, index: usize) -> String;

    /// Quote a column name so it is never interpreted as SQL
    ///
    /// Defaults to ANSI double quotes with embedded quotes doubled.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
