//! Core application

use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::core::cli::{self, CliConfig, Commands, FilterInput, OutputFormat};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, ENV_LOG, ENV_LOG_FORMAT};
use crate::filters::{FilterCompiler, FilterError, Predicate, SqlFragment, SqlRenderer};
use crate::query::SelectQuery;
use crate::utils::file::{read_file_bytes, read_stdin_bytes};

pub struct CoreApp {
    pub config: AppConfig,
    compiler: FilterCompiler,
    renderer: SqlRenderer,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        app.execute(&command, &mut out)?;
        out.flush().context("Failed to flush output")
    }

    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        let compiler = config.compiler.compiler();
        let renderer = config.render.renderer();
        Self {
            config,
            compiler,
            renderer,
        }
    }

    /// Execute one command, writing its result to `out`
    pub fn execute<W: Write>(&self, command: &Commands, out: &mut W) -> Result<()> {
        match command {
            Commands::Check { input } => {
                let predicate = self.compile(input)?;
                tracing::debug!(leaves = predicate.leaf_count(), "Filter is valid");
                writeln!(out, "ok")?;
            }
            Commands::Compile {
                input,
                table,
                columns,
                format,
            } => {
                if *format == OutputFormat::Tree {
                    let predicate = self.compile(input)?;
                    let tree = serde_json::to_string_pretty(&predicate)?;
                    writeln!(out, "{}", tree)?;
                    return Ok(());
                }

                let fragment = match table {
                    Some(table) => self.select(input, table, columns)?,
                    None => self.condition(input)?,
                };
                write_fragment(out, &fragment, *format)?;
            }
        }
        Ok(())
    }

    fn compile(&self, input: &FilterInput) -> Result<Predicate> {
        let raw = self.read_input(input)?;
        self.compiler.compile(&raw).map_err(filter_error)
    }

    /// Render a bare condition; an empty filter renders as nothing
    fn condition(&self, input: &FilterInput) -> Result<SqlFragment> {
        let predicate = self.compile(input)?;
        if predicate.is_empty() {
            return Ok(SqlFragment::default());
        }
        Ok(self.renderer.render(&predicate))
    }

    fn select(&self, input: &FilterInput, table: &str, columns: &[String]) -> Result<SqlFragment> {
        let raw = self.read_input(input)?;
        let mut query = SelectQuery::new(columns.iter().cloned()).from(table);
        query
            .apply_filter(&self.compiler, &raw)
            .map_err(filter_error)?;
        Ok(query.to_sql(&self.renderer))
    }

    /// Read the filter document from the argument, a file, or stdin
    ///
    /// File and stdin reads stop one byte past the size limit, which the
    /// compiler then rejects.
    fn read_input(&self, input: &FilterInput) -> Result<Vec<u8>> {
        if let Some(filter) = &input.filter {
            return Ok(filter.as_bytes().to_vec());
        }
        let limit = self.compiler.max_input_bytes();
        if let Some(path) = &input.file {
            return read_file_bytes(path, limit);
        }
        tracing::debug!("Reading filter from stdin");
        read_stdin_bytes(limit)
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        let json = std::env::var(ENV_LOG_FORMAT)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        // stdout carries command output, logs go to stderr
        if json {
            tracing_subscriber::fmt()
                .json()
                .with_writer(io::stderr)
                .with_env_filter(filter)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true)
                .with_ansi(true)
                .compact()
                .with_env_filter(filter)
                .init();
        }
    }
}

fn filter_error(e: FilterError) -> anyhow::Error {
    anyhow::anyhow!("{} [{}]", e, e.code())
}

fn write_fragment<W: Write>(out: &mut W, fragment: &SqlFragment, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(fragment)?)?;
        }
        _ => {
            writeln!(out, "{}", fragment.sql)?;
            writeln!(out, "{}", serde_json::to_string(&fragment.params)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CompilerConfig, RenderConfig};
    use crate::filters::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT_BYTES, NullPolicy};
    use crate::sql::Backend;

    fn app(dialect: Backend) -> CoreApp {
        CoreApp::from_config(AppConfig {
            compiler: CompilerConfig {
                max_depth: DEFAULT_MAX_DEPTH,
                max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            },
            render: RenderConfig {
                dialect,
                null_policy: NullPolicy::Strict,
                quote_identifiers: false,
            },
        })
    }

    fn input(filter: &str) -> FilterInput {
        FilterInput {
            filter: Some(filter.to_string()),
            file: None,
        }
    }

    fn compile_cmd(filter: &str, table: Option<&str>, format: OutputFormat) -> Commands {
        Commands::Compile {
            input: input(filter),
            table: table.map(str::to_string),
            columns: Vec::new(),
            format,
        }
    }

    fn run(app: &CoreApp, command: &Commands) -> Result<String> {
        let mut out = Vec::new();
        app.execute(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_check_ok() {
        let command = Commands::Check {
            input: input(r#"[{"Rating":{"$eq":"PG"}}]"#),
        };
        assert_eq!(run(&app(Backend::Sqlite), &command).unwrap(), "ok\n");
    }

    #[test]
    fn test_check_reports_error_with_code() {
        let command = Commands::Check {
            input: input(r#"[{"Rating":{"$like":"PG"}}]"#),
        };
        let err = run(&app(Backend::Sqlite), &command).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown filter operator '$like' at $[0].Rating.$like"));
        assert!(message.contains("UNKNOWN_FILTER_OPERATOR"));
    }

    #[test]
    fn test_compile_text() {
        let command = compile_cmd(
            r#"[{"Rating":{"$in":["PG","R"]}}]"#,
            None,
            OutputFormat::Text,
        );
        let output = run(&app(Backend::Sqlite), &command).unwrap();
        assert_eq!(output, "(Rating IN (?,?))\n[\"PG\",\"R\"]\n");
    }

    #[test]
    fn test_compile_json_postgres() {
        let command = compile_cmd(
            r#"[{"A":{"$gt":1}},{"B":{"$isnull":true}}]"#,
            None,
            OutputFormat::Json,
        );
        let output = run(&app(Backend::Postgres), &command).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["sql"], "(A > $1 AND B IS NULL)");
        assert_eq!(value["args"], serde_json::json!([1]));
    }

    #[test]
    fn test_compile_tree() {
        let command = compile_cmd(r#"[{"A":{"$eq":1}}]"#, None, OutputFormat::Tree);
        let output = run(&app(Backend::Sqlite), &command).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value.get("conjunction").is_some());
    }

    #[test]
    fn test_compile_empty_filter_renders_nothing() {
        let command = compile_cmd("[]", None, OutputFormat::Text);
        let output = run(&app(Backend::Sqlite), &command).unwrap();
        assert_eq!(output, "\n[]\n");
    }

    #[test]
    fn test_compile_select() {
        let command = Commands::Compile {
            input: input(r#"[{"Rating":{"$eq":"PG"}}]"#),
            table: Some("movies".to_string()),
            columns: vec!["MovieName".to_string(), "Rating".to_string()],
            format: OutputFormat::Text,
        };
        let output = run(&app(Backend::Sqlite), &command).unwrap();
        assert_eq!(
            output,
            "SELECT MovieName, Rating FROM movies WHERE (Rating = ?)\n[\"PG\"]\n"
        );
    }

    #[test]
    fn test_compile_select_empty_filter() {
        let command = compile_cmd("", Some("movies"), OutputFormat::Text);
        let output = run(&app(Backend::Sqlite), &command).unwrap();
        assert_eq!(output, "SELECT * FROM movies\n[]\n");
    }

    #[test]
    fn test_compile_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"Score":{"$lte":9.5}}]"#).unwrap();

        let command = Commands::Compile {
            input: FilterInput {
                filter: None,
                file: Some(file.path().to_path_buf()),
            },
            table: None,
            columns: Vec::new(),
            format: OutputFormat::Text,
        };
        let output = run(&app(Backend::Duckdb), &command).unwrap();
        assert_eq!(output, "(Score <= ?)\n[9.5]\n");
    }

    #[test]
    fn test_oversized_file_rejected_without_full_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![b' '; DEFAULT_MAX_INPUT_BYTES * 4]).unwrap();

        let command = Commands::Check {
            input: FilterInput {
                filter: None,
                file: Some(file.path().to_path_buf()),
            },
        };
        let err = run(&app(Backend::Sqlite), &command).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("FILTER_JSON_TOO_LARGE"));
        assert!(message.contains(&format!("{} bytes read", DEFAULT_MAX_INPUT_BYTES + 1)));
    }

    #[test]
    fn test_compile_malformed_json() {
        let command = compile_cmd("[{", None, OutputFormat::Text);
        let err = run(&app(Backend::Sqlite), &command).unwrap_err();
        assert!(err.to_string().contains("INVALID_FILTER_JSON"));
    }
}
