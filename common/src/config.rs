//! Environment-driven configuration.
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file). Unparseable values fall back to their defaults.

use std::str::FromStr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8083;
const DEFAULT_LLM_ENDPOINT: &str = "http://localhost:11434/api/generate";
const DEFAULT_LLM_MODEL: &str = "llama3.2:latest";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_USERNAME: &str = "root";
const DEFAULT_DB_DATABASE: &str = "rag_test";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and response metadata.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    pub llm: LlmConfig,
    pub database: DatabaseDefaults,
    pub pipeline: PipelineConfig,
}

/// Local inference server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Generation endpoint URL.
    pub endpoint: String,
    /// Default model identifier.
    pub model: String,
    /// Request timeout; `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
}

/// Default connection parameters offered to callers.
///
/// The password is deliberately absent: it is always caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDefaults {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub database: String,
    pub connect_timeout_secs: u64,
    pub max_connections: u32,
}

/// Orchestration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Forward a failed stage's error text into the next stage instead of
    /// stopping the run.
    pub forward_stage_errors: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for DatabaseDefaults {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            username: DEFAULT_DB_USERNAME.to_string(),
            database: DEFAULT_DB_DATABASE.to_string(),
            connect_timeout_secs: 10,
            max_connections: 1,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            forward_stage_errors: true,
        }
    }
}

impl AppConfig {
    /// Loads configuration for a service from the process environment.
    ///
    /// A `.env` file in the working directory is read first, without
    /// overriding variables that are already set.
    pub fn load_with_service(service_name: &str) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "已加载 .env 文件");
        }
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm_defaults = LlmConfig::default();
        let db_defaults = DatabaseDefaults::default();
        let pipeline_defaults = PipelineConfig::default();

        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT),
            llm: LlmConfig {
                endpoint: lookup("LLM_ENDPOINT").unwrap_or(llm_defaults.endpoint),
                model: lookup("LLM_MODEL").unwrap_or(llm_defaults.model),
                timeout_secs: lookup("LLM_TIMEOUT_SECS").and_then(|v| parse_value("LLM_TIMEOUT_SECS", &v)),
            },
            database: DatabaseDefaults {
                host: lookup("DB_HOST").unwrap_or(db_defaults.host),
                port: parse_or(&lookup, "DB_PORT", db_defaults.port),
                username: lookup("DB_USERNAME").unwrap_or(db_defaults.username),
                database: lookup("DB_DATABASE").unwrap_or(db_defaults.database),
                connect_timeout_secs: parse_or(
                    &lookup,
                    "DB_CONNECT_TIMEOUT_SECS",
                    db_defaults.connect_timeout_secs,
                ),
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", db_defaults.max_connections),
            },
            pipeline: PipelineConfig {
                forward_stage_errors: parse_or(
                    &lookup,
                    "PIPELINE_FORWARD_ERRORS",
                    pipeline_defaults.forward_stage_errors,
                ),
            },
        }
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|raw| parse_value(key, &raw))
        .unwrap_or(default)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "配置值无效，使用默认值");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup("ai-service", |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.service_name, "ai-service");
        assert_eq!(config.port, 8083);
        assert_eq!(config.llm.model, "llama3.2:latest");
        assert_eq!(config.llm.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(config.llm.timeout_secs, None);
        assert_eq!(config.database, DatabaseDefaults::default());
        assert_eq!(config.database.database, "rag_test");
        assert!(config.pipeline.forward_stage_errors);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SERVER_PORT", "9000"),
            ("LLM_MODEL", "qwen2.5-coder"),
            ("LLM_TIMEOUT_SECS", "45"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("PIPELINE_FORWARD_ERRORS", "false"),
        ]);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.llm.model, "qwen2.5-coder");
        assert_eq!(config.llm.timeout_secs, Some(45));
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert!(!config.pipeline.forward_stage_errors);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[("DB_PORT", "not-a-port"), ("PIPELINE_FORWARD_ERRORS", "maybe")]);
        assert_eq!(config.database.port, 3306);
        assert!(config.pipeline.forward_stage_errors);
    }
}
