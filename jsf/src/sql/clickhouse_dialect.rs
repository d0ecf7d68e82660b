//! ClickHouse SQL dialect implementation

use super::SqlDialect;

/// ClickHouse SQL dialect
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn placeholder(&self, _index: usize) -> String {
        // ClickHouse uses ? for positional parameters
        "?".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.placeholder(2), "?");
    }

    #[test]
    fn test_quote_identifier_uses_backticks() {
        let dialect = ClickhouseDialect;
        assert_eq!(dialect.quote_identifier("status"), "`status`");
        assert_eq!(dialect.quote_identifier("a`b"), "`a\\`b`");
    }
}
