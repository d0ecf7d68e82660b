use clap::{Args, Parser, Subcommand};

use std::fmt;
use std::path::PathBuf;

use crate::filters::NullPolicy;
use crate::sql::Backend;

use super::constants::{
    APP_NAME, ENV_CONFIG, ENV_DIALECT, ENV_MAX_DEPTH, ENV_MAX_INPUT_BYTES, ENV_NULL_POLICY,
    ENV_QUOTE_IDENTIFIERS,
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(
    version,
    about = "Compile JSON filter documents into parameterized SQL",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQL dialect (sqlite, postgres, duckdb, clickhouse)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_dialect)]
    pub dialect: Option<Backend>,

    /// How $ne/$notin treat NULL columns (strict or include-null)
    #[arg(long, global = true, env = ENV_NULL_POLICY, value_parser = parse_null_policy)]
    pub null_policy: Option<NullPolicy>,

    /// Maximum nesting depth of $and/$or groups
    #[arg(long, global = true, env = ENV_MAX_DEPTH)]
    pub max_depth: Option<usize>,

    /// Maximum filter document size in bytes
    #[arg(long, global = true, env = ENV_MAX_INPUT_BYTES)]
    pub max_input_bytes: Option<usize>,

    /// Quote field names using the dialect's identifier quoting
    #[arg(long, global = true, env = ENV_QUOTE_IDENTIFIERS)]
    pub quote_identifiers: Option<bool>,
}

/// Parse SQL dialect from CLI/env string
fn parse_dialect(s: &str) -> Result<Backend, String> {
    Backend::parse(s)
}

/// Parse null policy from CLI/env string
fn parse_null_policy(s: &str) -> Result<NullPolicy, String> {
    NullPolicy::parse(s)
}

/// Parse output format from CLI string
fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "tree" => Ok(OutputFormat::Tree),
        _ => Err(format!(
            "Invalid output format '{}'. Valid options: text, json, tree",
            s
        )),
    }
}

/// How `compile` prints its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// SQL on the first line, JSON argument array on the second
    #[default]
    Text,
    /// `{"sql": ..., "args": [...]}`
    Json,
    /// The compiled predicate tree as JSON
    Tree,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Tree => write!(f, "tree"),
        }
    }
}

/// Where the filter document comes from
#[derive(Args, Clone, Debug, Default)]
pub struct FilterInput {
    /// Filter document (reads stdin when neither this nor --file is given)
    pub filter: Option<String>,

    /// Read the filter document from a file
    #[arg(long, short = 'f', conflicts_with = "filter")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a filter and print the rendered SQL with its arguments
    Compile {
        #[command(flatten)]
        input: FilterInput,

        /// Render a full SELECT against this table instead of a bare condition
        #[arg(long, short = 't')]
        table: Option<String>,

        /// Columns to select (comma separated, defaults to *)
        #[arg(long, value_delimiter = ',', requires = "table")]
        columns: Vec<String>,

        /// Output format (text, json or tree)
        #[arg(long, default_value_t = OutputFormat::Text, value_parser = parse_output_format)]
        format: OutputFormat,
    },
    /// Validate a filter without rendering it
    Check {
        #[command(flatten)]
        input: FilterInput,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub dialect: Option<Backend>,
    pub null_policy: Option<NullPolicy>,
    pub max_depth: Option<usize>,
    pub max_input_bytes: Option<usize>,
    pub quote_identifiers: Option<bool>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    split(Cli::parse())
}

fn split(cli: Cli) -> (CliConfig, Commands) {
    let config = CliConfig {
        config: cli.config,
        dialect: cli.dialect,
        null_policy: cli.null_policy,
        max_depth: cli.max_depth,
        max_input_bytes: cli.max_input_bytes,
        quote_identifiers: cli.quote_identifiers,
    };
    (config, cli.command)
}
