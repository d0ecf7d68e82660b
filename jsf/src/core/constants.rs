// =============================================================================
// Application Identity
// =============================================================================

/// Application name (binary, paths and identifiers)
pub const APP_NAME: &str = "jsf";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".jsf";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "jsf.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "JSF_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "JSF_LOG";

/// Environment variable selecting the log format (`json` for structured output)
pub const ENV_LOG_FORMAT: &str = "JSF_LOG_FORMAT";

// =============================================================================
// Environment Variables - Compiler
// =============================================================================

/// Environment variable for the maximum `$and`/`$or` nesting depth
pub const ENV_MAX_DEPTH: &str = "JSF_MAX_DEPTH";

/// Environment variable for the maximum filter document size in bytes
pub const ENV_MAX_INPUT_BYTES: &str = "JSF_MAX_INPUT_BYTES";

// =============================================================================
// Environment Variables - Rendering
// =============================================================================

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "JSF_DIALECT";

/// Environment variable for the negation null policy
pub const ENV_NULL_POLICY: &str = "JSF_NULL_POLICY";

/// Environment variable to quote field names in rendered SQL
pub const ENV_QUOTE_IDENTIFIERS: &str = "JSF_QUOTE_IDENTIFIERS";
