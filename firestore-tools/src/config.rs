//! CLI configuration management
//!
//! Handles loading and saving CLI-specific configuration.

use anyhow::{Context, Result};
use firestore_tools_core::default_config_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output formats accepted by `output_format`
pub const OUTPUT_FORMATS: &[&str] = &["text", "json", "paths"];

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Service-account credential file
    pub credential: String,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Project id (overrides the credential file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Database id
    pub database: String,

    /// Firestore emulator `host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emulator_host: Option<String>,

    /// Retries on connection failures
    pub max_retries: u32,

    /// Page size for list requests
    pub page_size: u32,

    /// Pager command for the pager demo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            credential: "credential.json".to_string(),
            output_format: "text".to_string(),
            verbose: false,
            timeout: 30,
            project: None,
            database: "(default)".to_string(),
            emulator_host: None,
            max_retries: 3,
            page_size: 300,
            pager: None,
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist. Nothing is written.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse CLI config file {}", path.display()))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content).context("Failed to write CLI config file")?;

        Ok(())
    }

    /// Resolve the configuration file path: explicit path, else the default.
    pub fn config_path(explicit: Option<&str>) -> PathBuf {
        explicit
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path)
    }

    /// Set a single key from its string form, with validation.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "credential" => {
                ConfigBuilder::validate_credential(value)?;
                self.credential = value.to_string();
            }
            "output_format" => {
                ConfigBuilder::validate_output_format(value)?;
                self.output_format = value.to_string();
            }
            "verbose" => self.verbose = parse_bool(value),
            "timeout" => {
                let timeout = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid timeout value. Must be a number"))?;
                ConfigBuilder::validate_timeout(timeout)?;
                self.timeout = timeout;
            }
            "project" => self.project = non_empty(value),
            "database" => {
                ConfigBuilder::validate_database(value)?;
                self.database = value.to_string();
            }
            "emulator_host" => self.emulator_host = non_empty(value),
            "max_retries" => {
                let retries = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid max_retries value. Must be a number"))?;
                ConfigBuilder::validate_max_retries(retries)?;
                self.max_retries = retries;
            }
            "page_size" => {
                let size = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid page_size value. Must be a number"))?;
                ConfigBuilder::validate_page_size(size)?;
                self.page_size = size;
            }
            "pager" => self.pager = non_empty(value),
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

fn parse_bool(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// `with_env_overrides` and `with_config_file` only fill values that are
/// still unset, so call them in priority order (env before file). The
/// `with_*` setters always overwrite and are meant for CLI arguments.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    credential: Option<String>,
    output_format: Option<String>,
    verbose: Option<bool>,
    timeout: Option<u64>,
    project: Option<String>,
    database: Option<String>,
    emulator_host: Option<String>,
    max_retries: Option<u32>,
    page_size: Option<u32>,
    pager: Option<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set credential file path (with validation)
    pub fn with_credential(mut self, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        Self::validate_credential(&path)?;
        self.credential = Some(path);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        Self::validate_timeout(timeout)?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Set project id
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set emulator host
    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    /// Load configuration from file, filling only unset values
    pub fn with_config_file(self, path: &Path) -> Result<Self> {
        let config = CliConfig::load_from(path)?;
        let builder = self;

        Ok(Self {
            credential: builder.credential.or(Some(config.credential)),
            output_format: builder.output_format.or(Some(config.output_format)),
            verbose: builder.verbose.or(Some(config.verbose)),
            timeout: builder.timeout.or(Some(config.timeout)),
            project: builder.project.or(config.project),
            database: builder.database.or(Some(config.database)),
            emulator_host: builder.emulator_host.or(config.emulator_host),
            max_retries: builder.max_retries.or(Some(config.max_retries)),
            page_size: builder.page_size.or(Some(config.page_size)),
            pager: builder.pager.or(config.pager),
        })
    }

    /// Apply environment variable overrides, filling only unset values
    pub fn with_env_overrides(mut self) -> Self {
        if self.credential.is_none() {
            if let Ok(credential) = std::env::var("FIRESTORE_TOOLS_CREDENTIAL") {
                if Self::validate_credential(&credential).is_ok() {
                    self.credential = Some(credential);
                }
            }
        }

        if self.output_format.is_none() {
            if let Ok(format) = std::env::var("FIRESTORE_TOOLS_FORMAT") {
                // Validate before applying
                if Self::validate_output_format(&format).is_ok() {
                    self.output_format = Some(format);
                }
            }
        }

        if self.verbose.is_none() {
            if let Ok(verbose) = std::env::var("FIRESTORE_TOOLS_VERBOSE") {
                self.verbose = Some(parse_bool(&verbose));
            }
        }

        if self.timeout.is_none() {
            if let Ok(timeout) = std::env::var("FIRESTORE_TOOLS_TIMEOUT") {
                if let Ok(timeout) = timeout.parse() {
                    if Self::validate_timeout(timeout).is_ok() {
                        self.timeout = Some(timeout);
                    }
                }
            }
        }

        if self.project.is_none() {
            if let Ok(project) = std::env::var("FIRESTORE_TOOLS_PROJECT") {
                self.project = non_empty(&project);
            }
        }

        if self.database.is_none() {
            if let Ok(database) = std::env::var("FIRESTORE_TOOLS_DATABASE") {
                if Self::validate_database(&database).is_ok() {
                    self.database = Some(database);
                }
            }
        }

        if self.emulator_host.is_none() {
            if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
                self.emulator_host = non_empty(&host);
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();

        let credential = self.credential.unwrap_or(defaults.credential);
        let output_format = self.output_format.unwrap_or(defaults.output_format);
        let timeout = self.timeout.unwrap_or(defaults.timeout);
        let database = self.database.unwrap_or(defaults.database);
        let max_retries = self.max_retries.unwrap_or(defaults.max_retries);
        let page_size = self.page_size.unwrap_or(defaults.page_size);

        // Validate final values
        Self::validate_credential(&credential)?;
        Self::validate_output_format(&output_format)?;
        Self::validate_timeout(timeout)?;
        Self::validate_database(&database)?;
        Self::validate_max_retries(max_retries)?;
        Self::validate_page_size(page_size)?;

        Ok(CliConfig {
            credential,
            output_format,
            verbose: self.verbose.unwrap_or(defaults.verbose),
            timeout,
            project: self.project.or(defaults.project),
            database,
            emulator_host: self.emulator_host.or(defaults.emulator_host),
            max_retries,
            page_size,
            pager: self.pager.or(defaults.pager),
        })
    }

    fn validate_credential(path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(anyhow::anyhow!("Credential path cannot be empty"));
        }
        Ok(())
    }

    fn validate_output_format(format: &str) -> Result<()> {
        if OUTPUT_FORMATS.contains(&format) {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be one of: {}",
                format,
                OUTPUT_FORMATS.join(", ")
            ))
        }
    }

    fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout > 300 {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to 300 seconds"
            ));
        }

        Ok(())
    }

    fn validate_database(database: &str) -> Result<()> {
        if database.trim().is_empty() || database.contains('/') {
            return Err(anyhow::anyhow!(
                "Invalid database id '{}'",
                database
            ));
        }
        Ok(())
    }

    fn validate_max_retries(retries: u32) -> Result<()> {
        if retries > 10 {
            return Err(anyhow::anyhow!("max_retries must be at most 10"));
        }
        Ok(())
    }

    fn validate_page_size(size: u32) -> Result<()> {
        if size == 0 || size > 1000 {
            return Err(anyhow::anyhow!("page_size must be between 1 and 1000"));
        }
        Ok(())
    }
}
