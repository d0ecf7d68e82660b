use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::filters::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT_BYTES, FilterCompiler, MAX_SUPPORTED_DEPTH, NullPolicy,
    SqlRenderer,
};
use crate::sql::Backend;
use crate::utils::file::expand_home;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Configuration (JSON)
// =============================================================================

/// Compiler limits section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CompilerFileConfig {
    /// Maximum nesting depth of $and/$or groups (default: 32)
    pub max_depth: Option<usize>,
    /// Maximum filter document size in bytes (default: 65536)
    pub max_input_bytes: Option<usize>,
}

/// Rendering section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RenderFileConfig {
    /// SQL dialect: sqlite (default), postgres, duckdb or clickhouse
    pub dialect: Option<Backend>,
    /// strict (default) or include-null
    pub null_policy: Option<NullPolicy>,
    /// Quote field names through the dialect (default: false)
    pub quote_identifiers: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub compiler: Option<CompilerFileConfig>,
    pub render: Option<RenderFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of top-level keys this version does not understand
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let unknown = self.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(
                fields = %unknown.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(compiler) = other.compiler {
            let current = self.compiler.get_or_insert_with(CompilerFileConfig::default);
            if compiler.max_depth.is_some() {
                tracing::trace!(max_depth = ?compiler.max_depth, "Merging compiler.max_depth");
                current.max_depth = compiler.max_depth;
            }
            if compiler.max_input_bytes.is_some() {
                tracing::trace!(
                    max_input_bytes = ?compiler.max_input_bytes,
                    "Merging compiler.max_input_bytes"
                );
                current.max_input_bytes = compiler.max_input_bytes;
            }
        }

        if let Some(render) = other.render {
            let current = self.render.get_or_insert_with(RenderFileConfig::default);
            if render.dialect.is_some() {
                tracing::trace!(dialect = ?render.dialect, "Merging render.dialect");
                current.dialect = render.dialect;
            }
            if render.null_policy.is_some() {
                tracing::trace!(null_policy = ?render.null_policy, "Merging render.null_policy");
                current.null_policy = render.null_policy;
            }
            if render.quote_identifiers.is_some() {
                current.quote_identifiers = render.quote_identifiers;
            }
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Compiler limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    pub max_depth: usize,
    pub max_input_bytes: usize,
}

impl CompilerConfig {
    pub fn compiler(&self) -> FilterCompiler {
        FilterCompiler::new()
            .with_max_depth(self.max_depth)
            .with_max_input_bytes(self.max_input_bytes)
    }
}

/// SQL rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub dialect: Backend,
    pub null_policy: NullPolicy,
    pub quote_identifiers: bool,
}

impl RenderConfig {
    pub fn renderer(&self) -> SqlRenderer {
        SqlRenderer::new(self.dialect)
            .with_null_policy(self.null_policy)
            .with_quoted_identifiers(self.quote_identifiers)
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub compiler: CompilerConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.jsf/jsf.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let profile_path = get_profile_config_path();
        Self::load_from(cli, profile_path.as_deref(), Path::new(CONFIG_FILE_NAME))
    }

    /// Load with explicit profile and local config locations
    fn load_from(cli: &CliConfig, profile_path: Option<&Path>, local_path: &Path) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.jsf/jsf.json) - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_home(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else if local_path.exists() {
            Some(local_path.to_path_buf())
        } else {
            None
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::resolve(file_config, cli)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_compiler = file_config.compiler.unwrap_or_default();
        let file_render = file_config.render.unwrap_or_default();

        let compiler = CompilerConfig {
            max_depth: cli
                .max_depth
                .or(file_compiler.max_depth)
                .unwrap_or(DEFAULT_MAX_DEPTH),
            max_input_bytes: cli
                .max_input_bytes
                .or(file_compiler.max_input_bytes)
                .unwrap_or(DEFAULT_MAX_INPUT_BYTES),
        };

        let render = RenderConfig {
            dialect: cli.dialect.or(file_render.dialect).unwrap_or_default(),
            null_policy: cli
                .null_policy
                .or(file_render.null_policy)
                .unwrap_or_default(),
            quote_identifiers: cli
                .quote_identifiers
                .or(file_render.quote_identifiers)
                .unwrap_or(false),
        };

        let config = Self { compiler, render };
        config.validate()?;

        tracing::debug!(
            dialect = %config.render.dialect,
            null_policy = %config.render.null_policy,
            max_depth = config.compiler.max_depth,
            "Configuration resolved"
        );

        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.compiler.max_depth == 0 {
            anyhow::bail!("Configuration error: compiler.max_depth must be greater than 0");
        }
        if self.compiler.max_depth > MAX_SUPPORTED_DEPTH {
            anyhow::bail!(
                "Configuration error: compiler.max_depth must be at most {} (got {})",
                MAX_SUPPORTED_DEPTH,
                self.compiler.max_depth
            );
        }
        if self.compiler.max_input_bytes == 0 {
            anyhow::bail!("Configuration error: compiler.max_input_bytes must be greater than 0");
        }
        Ok(())
    }
}

/// Get the profile config path (~/.jsf/jsf.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
