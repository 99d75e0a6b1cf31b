//! Configuration loading
//!
//! Settings resolve with **ENV → TOML → compiled default** priority. A missing
//! TOML file is not an error: a warning is logged and the remaining tiers apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "KWC_CONFIG";

/// Compiled defaults, used when neither ENV nor TOML provide a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub openai_model: String,
    pub openai_base_url: String,
    pub shopify_api_version: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prompt_file: PathBuf,
    pub poll_interval_minutes: u64,
    pub enable_background_runner: bool,
    pub bind_address: String,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            openai_model: "gpt-4.1-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            shopify_api_version: "2024-01".to_string(),
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            prompt_file: PathBuf::from("./prompts.json"),
            poll_interval_minutes: 1440,
            enable_background_runner: false,
            bind_address: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// On-disk TOML configuration; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub shopify_store_domain: Option<String>,
    pub shopify_access_token: Option<String>,
    pub shopify_api_version: Option<String>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub prompt_file: Option<PathBuf>,
    pub poll_interval_minutes: Option<u64>,
    pub enable_background_runner: Option<bool>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}

/// Storefront credentials, present only when both parts are configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontCredentials {
    pub store_domain: String,
    pub access_token: String,
}

/// Fully resolved application settings
///
/// Constructed once at startup and passed to the services that need it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub shopify_store_domain: Option<String>,
    pub shopify_access_token: Option<String>,
    pub shopify_api_version: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prompt_file: PathBuf,
    pub poll_interval_minutes: u64,
    pub enable_background_runner: bool,
    pub bind_address: String,
    pub log_level: String,
}

impl Settings {
    /// Load settings, reading the TOML file at `config_path` or the default location
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => env_value(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .or_else(default_config_path),
        };

        let toml_config = match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file not found at {}, using environment and defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => TomlConfig::default(),
        };

        Self::resolve(&toml_config)
    }

    /// Resolve each field from ENV, then TOML, then compiled defaults
    pub fn resolve(toml_config: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        Ok(Self {
            openai_api_key: env_value("OPENAI_API_KEY")
                .or_else(|| non_blank(toml_config.openai_api_key.as_deref())),
            openai_model: env_value("OPENAI_MODEL")
                .or_else(|| non_blank(toml_config.openai_model.as_deref()))
                .unwrap_or(defaults.openai_model),
            openai_base_url: env_value("OPENAI_BASE_URL")
                .or_else(|| non_blank(toml_config.openai_base_url.as_deref()))
                .unwrap_or(defaults.openai_base_url),
            shopify_store_domain: env_value("SHOPIFY_STORE_DOMAIN")
                .or_else(|| non_blank(toml_config.shopify_store_domain.as_deref())),
            shopify_access_token: env_value("SHOPIFY_ACCESS_TOKEN")
                .or_else(|| non_blank(toml_config.shopify_access_token.as_deref())),
            shopify_api_version: env_value("SHOPIFY_API_VERSION")
                .or_else(|| non_blank(toml_config.shopify_api_version.as_deref()))
                .unwrap_or(defaults.shopify_api_version),
            input_dir: env_value("INPUT_DIR")
                .map(PathBuf::from)
                .or_else(|| toml_config.input_dir.clone())
                .unwrap_or(defaults.input_dir),
            output_dir: env_value("OUTPUT_DIR")
                .map(PathBuf::from)
                .or_else(|| toml_config.output_dir.clone())
                .unwrap_or(defaults.output_dir),
            prompt_file: env_value("PROMPT_FILE")
                .map(PathBuf::from)
                .or_else(|| toml_config.prompt_file.clone())
                .unwrap_or(defaults.prompt_file),
            poll_interval_minutes: match env_value("POLL_INTERVAL_MINUTES") {
                Some(raw) => raw.parse().map_err(|_| {
                    Error::Config(format!("POLL_INTERVAL_MINUTES must be an integer, got '{}'", raw))
                })?,
                None => toml_config
                    .poll_interval_minutes
                    .unwrap_or(defaults.poll_interval_minutes),
            },
            enable_background_runner: match env_value("ENABLE_BACKGROUND_RUNNER") {
                Some(raw) => parse_bool("ENABLE_BACKGROUND_RUNNER", &raw)?,
                None => toml_config
                    .enable_background_runner
                    .unwrap_or(defaults.enable_background_runner),
            },
            bind_address: env_value("KWC_BIND_ADDRESS")
                .or_else(|| non_blank(toml_config.bind_address.as_deref()))
                .unwrap_or(defaults.bind_address),
            log_level: env_value("KWC_LOG_LEVEL")
                .or_else(|| non_blank(toml_config.log_level.as_deref()))
                .unwrap_or(defaults.log_level),
        })
    }

    /// Create the input/output directories and the prompt file's parent
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.input_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        if let Some(parent) = self.prompt_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Storefront credentials if both domain and token are set
    pub fn storefront_credentials(&self) -> Option<StorefrontCredentials> {
        let store_domain = non_blank(self.shopify_store_domain.as_deref())?;
        let access_token = non_blank(self.shopify_access_token.as_deref())?;
        Some(StorefrontCredentials {
            store_domain,
            access_token,
        })
    }

    /// Sleep between background runner cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes.saturating_mul(60))
    }
}

/// Default config file path for the platform (`<config dir>/kwc/kwc.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kwc").join("kwc.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_blank(Some(&v)))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got '{}'", name, raw))),
    }
}
