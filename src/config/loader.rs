//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, PostgreSQLConfig, SeederConfig};
use crate::config::secret_string;
use crate::domain::errors::SeedError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix of environment variables that override file values
pub const ENV_PREFIX: &str = "SEED_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SeederConfig`]
/// 4. Applies environment variable overrides (`SEED_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SeedError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use noc_seeder::config::load_config;
///
/// let config = load_config("seed.toml").expect("Failed to load config");
/// println!("batch size: {}", config.seed.batch_size);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SeederConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SeedError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SeedError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
///
/// # Errors
///
/// Same conditions as [`load_config`], minus file access.
pub fn parse_config(contents: &str) -> Result<SeederConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SeederConfig = toml::from_str(&contents)
        .map_err(|e| SeedError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SeedError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SeedError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        if index > 0 {
            result.push('\n');
        }

        if line.trim_start().starts_with('#') {
            result.push_str(line);
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
    }

    if !missing_vars.is_empty() {
        return Err(SeedError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SeedError::Configuration(format!(
            "Invalid value '{value}' for environment variable {ENV_PREFIX}{key}"
        ))
    })
}

/// Applies environment variable overrides using the `SEED_*` prefix
///
/// Variables follow the pattern `SEED_<SECTION>_<KEY>`, for example
/// `SEED_SEED_BATCH_SIZE` or `SEED_POSTGRESQL_CONNECTION_STRING`.
fn apply_env_overrides(config: &mut SeederConfig) -> Result<()> {
    if let Some(val) = env_var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_var("APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_env("APPLICATION_DRY_RUN", &val)?;
    }

    if let Some(val) = env_var("DATABASE_TARGET") {
        config.database_target = match val.trim().to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(SeedError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}DATABASE_TARGET"
                )))
            }
        };
    }

    if let Some(val) = env_var("POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql.as_mut() {
            Some(pg) => pg.connection_string = secret_string(val),
            None => {
                config.postgresql = Some(PostgreSQLConfig {
                    connection_string: secret_string(val),
                    max_connections: 10,
                    connection_timeout_seconds: 30,
                    statement_timeout_seconds: 60,
                    ssl_mode: "prefer".to_string(),
                })
            }
        }
    }
    if let Some(pg) = config.postgresql.as_mut() {
        if let Some(val) = env_var("POSTGRESQL_MAX_CONNECTIONS") {
            pg.max_connections = parse_env("POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Some(val) = env_var("POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    if let Some(val) = env_var("SOURCES_PROGRAMS_PATH") {
        config.sources.programs_path = val;
    }
    if let Some(val) = env_var("SOURCES_UNIT_GROUPS_PATH") {
        config.sources.unit_groups_path = val;
    }
    if let Some(val) = env_var("SOURCES_OUTLOOKS_PATH") {
        config.sources.outlooks_path = val;
    }

    if let Some(val) = env_var("SEED_BATCH_SIZE") {
        config.seed.batch_size = parse_env("SEED_BATCH_SIZE", &val)?;
    }
    if let Some(val) = env_var("SEED_PARALLEL_GROUPS") {
        config.seed.parallel_groups = parse_env("SEED_PARALLEL_GROUPS", &val)?;
    }
    if let Some(val) = env_var("SEED_INTER_BATCH_DELAY_MS") {
        config.seed.inter_batch_delay_ms = parse_env("SEED_INTER_BATCH_DELAY_MS", &val)?;
    }

    if let Some(val) = env_var("RETRY_MAX_RETRIES") {
        config.retry.max_retries = parse_env("RETRY_MAX_RETRIES", &val)?;
    }
    if let Some(val) = env_var("RETRY_BASE_DELAY_MS") {
        config.retry.base_delay_ms = parse_env("RETRY_BASE_DELAY_MS", &val)?;
    }

    if let Some(val) = env_var("STATE_ENABLE_CHECKPOINTING") {
        config.state.enable_checkpointing = parse_env("STATE_ENABLE_CHECKPOINTING", &val)?;
    }
    if let Some(val) = env_var("STATE_CHECKPOINT_PATH") {
        config.state.checkpoint_path = val;
    }

    if let Some(val) = env_var("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_var("LOGGING_ERROR_LOG_ENABLED") {
        config.logging.error_log_enabled = parse_env("LOGGING_ERROR_LOG_ENABLED", &val)?;
    }

    Ok(())
}
