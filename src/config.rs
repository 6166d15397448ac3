use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Application configuration, read from `TESTDECK_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub suggestions: SuggestionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    DynamoDb,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "dynamodb" | "dynamo" => Ok(StorageBackend::DynamoDb),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Load the demo projects into the memory backend on startup.
    pub seed: bool,
    /// Artificial delay applied by the memory backend before each operation.
    pub latency: Duration,
    pub sequential_ids: bool,
}

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Base url of a remote suggestion service. Canned suggestions are used when unset.
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                seed: true,
                latency: Duration::ZERO,
                sequential_ids: false,
            },
            suggestions: SuggestionConfig {
                endpoint: None,
                timeout: Duration::from_secs(30),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let host = lookup("TESTDECK_HOST").unwrap_or(defaults.server.host);
        let port = parse_var(&lookup, "TESTDECK_PORT")?.unwrap_or(defaults.server.port);
        let backend = parse_var(&lookup, "TESTDECK_STORAGE")?.unwrap_or(defaults.storage.backend);
        let seed = parse_flag(&lookup, "TESTDECK_SEED")?.unwrap_or(defaults.storage.seed);
        let latency = parse_var::<u64, _>(&lookup, "TESTDECK_LATENCY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.storage.latency);
        let sequential_ids =
            parse_flag(&lookup, "TESTDECK_SEQUENTIAL_IDS")?.unwrap_or(defaults.storage.sequential_ids);
        let endpoint = lookup("TESTDECK_SUGGESTIONS_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let timeout = parse_var::<u64, _>(&lookup, "TESTDECK_SUGGESTIONS_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.suggestions.timeout);

        Ok(Config {
            server: ServerConfig { host, port },
            storage: StorageConfig {
                backend,
                seed,
                latency,
                sequential_ids,
            },
            suggestions: SuggestionConfig { endpoint, timeout },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn parse_flag<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.seed);
        assert_eq!(config.storage.latency, Duration::ZERO);
        assert!(config.suggestions.endpoint.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TESTDECK_PORT", "8080"),
            ("TESTDECK_STORAGE", "dynamodb"),
            ("TESTDECK_SEED", "false"),
            ("TESTDECK_LATENCY_MS", "250"),
            ("TESTDECK_SUGGESTIONS_URL", "http://localhost:9000/"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::DynamoDb);
        assert!(!config.storage.seed);
        assert_eq!(config.storage.latency, Duration::from_millis(250));
        assert_eq!(config.suggestions.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn rejects_invalid_values() {
        let result = Config::from_lookup(lookup_from(&[("TESTDECK_PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { name: "TESTDECK_PORT", .. })));

        let result = Config::from_lookup(lookup_from(&[("TESTDECK_STORAGE", "postgres")]));
        assert!(result.is_err());
    }
}
