//! Configuration management for Leadflow
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/leadflow/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{LeadflowError, Result};

/// Main configuration for Leadflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub models: ModelConfig,
    /// Agent behaviour configuration
    pub agent: AgentConfig,
    /// Thread state persistence
    #[serde(default)]
    pub store: StoreConfig,
    /// Customer/lead directory settings
    #[serde(default)]
    pub crm: CrmConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration, one per agent level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model driving the host assistant
    pub primary: String,
    /// Model driving the lead specialist
    pub specialist: String,
    /// Sampling temperature for the host assistant
    pub primary_temperature: f32,
    /// Sampling temperature for the specialist
    pub specialist_temperature: f32,
}

/// What to do when the router cannot classify a tool batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// End the turn and report it as unresolved
    #[default]
    EndTurn,
    /// Fail the turn with `LeadflowError::RoutingAmbiguous`
    Error,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Retries with a corrective prompt when the model answers with nothing
    /// Default: 3
    pub max_empty_retries: usize,
    /// Upper bound on node executions within one turn
    /// Default: 25
    pub max_steps_per_turn: usize,
    /// IANA timezone used for the "Current time" prompt context
    pub timezone: String,
    /// Routing fallback for mixed or unknown tool batches
    #[serde(default)]
    pub ambiguity_policy: AmbiguityPolicy,
    /// Whether to show debug output
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_empty_retries: 3,
            max_steps_per_turn: 25,
            timezone: env::var("LEADFLOW_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string()),
            ambiguity_policy: AmbiguityPolicy::default(),
            debug: env::var("LEADFLOW_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Where thread state is kept between turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Lost on exit; suitable for tests and demos
    Memory,
    /// One JSON document per thread on disk
    File,
}

/// Thread store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory for the file backend
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let backend = match env::var("LEADFLOW_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            _ => StoreBackend::File,
        };
        Self {
            backend,
            path: env::var("LEADFLOW_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Config::data_dir().join("threads")),
        }
    }
}

/// Lead directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// Minimum Jaro-Winkler similarity for a name to count as a match
    pub name_match_threshold: f64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            name_match_threshold: 0.86,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            primary: env::var("LEADFLOW_PRIMARY_MODEL")
                .unwrap_or_else(|_| "llama3.1:8b".to_string()),
            specialist: env::var("LEADFLOW_SPECIALIST_MODEL")
                .unwrap_or_else(|_| "llama3.1:8b".to_string()),
            primary_temperature: 1.0,
            specialist_temperature: 0.0,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leadflow")
    }

    /// Get the data directory path (thread state lives here)
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leadflow")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(LeadflowError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| LeadflowError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LeadflowError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| LeadflowError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LeadflowError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(Self::config_file(), content)
            .map_err(|e| LeadflowError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Resolve the configured timezone
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.agent
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| LeadflowError::config(format!("Invalid timezone '{}': {}", self.agent.timezone, e)))
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
