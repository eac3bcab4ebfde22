use crate::app_config::{AppConfig, ProviderConfig};
use crate::ConfigError;

const DEFAULT_PRIMARY_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SECONDARY_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_SECONDARY_MODEL: &str = "llama-3.1-8b-instant";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = optional("DATABASE_URL");
    let log_level = or_default("GEOVIS_LOG_LEVEL", "info");
    let entities_path = PathBuf::from(or_default(
        "GEOVIS_ENTITIES_PATH",
        "./config/entities.yaml",
    ));

    let db_max_connections = parse_u32("GEOVIS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("GEOVIS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("GEOVIS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let mut llm_providers = Vec::new();
    if let Some(api_key) = optional("GEOVIS_PRIMARY_LLM_API_KEY") {
        llm_providers.push(ProviderConfig {
            name: "primary".to_string(),
            base_url: or_default("GEOVIS_PRIMARY_LLM_BASE_URL", DEFAULT_PRIMARY_BASE_URL),
            model: or_default("GEOVIS_PRIMARY_LLM_MODEL", DEFAULT_PRIMARY_MODEL),
            api_key,
        });
    }
    if let Some(api_key) = optional("GEOVIS_SECONDARY_LLM_API_KEY") {
        llm_providers.push(ProviderConfig {
            name: "secondary".to_string(),
            base_url: or_default(
                "GEOVIS_SECONDARY_LLM_BASE_URL",
                DEFAULT_SECONDARY_BASE_URL,
            ),
            model: or_default("GEOVIS_SECONDARY_LLM_MODEL", DEFAULT_SECONDARY_MODEL),
            api_key,
        });
    }

    let llm_timeout_secs = parse_u64("GEOVIS_LLM_TIMEOUT_SECS", "20")?;
    if llm_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "GEOVIS_LLM_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let llm_max_tokens = parse_u32("GEOVIS_LLM_MAX_TOKENS", "500")?;
    let llm_retries_per_provider = parse_u32("GEOVIS_LLM_RETRIES_PER_PROVIDER", "1")?;
    let max_concurrent_answers = parse_usize("GEOVIS_MAX_CONCURRENT_ANSWERS", "4")?.max(1);

    Ok(AppConfig {
        database_url,
        log_level,
        entities_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        llm_providers,
        llm_timeout_secs,
        llm_max_tokens,
        llm_retries_per_provider,
        max_concurrent_answers,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
