// Configuration file handling: JSON on disk, defaults for every field,
// command-line overrides applied on top, validated before a scan starts.

use apitester_scanner::classifier::DEFAULT_USER_AGENT;
use apitester_scanner::{HeaderProfile, ProbeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/apitester/config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub browser: BrowserConfig,
    pub api_detection: ApiDetectionConfig,
    pub security: SecurityConfig,
    pub advanced: AdvancedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiDetectionConfig {
    /// Per-request timeout in seconds, fractions allowed
    pub timeout: f64,
    pub max_apis_per_scan: usize,
}

impl Default for ApiDetectionConfig {
    fn default() -> Self {
        Self {
            timeout: 30.0,
            max_apis_per_scan: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub verify_ssl: bool,
    pub allow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            verify_ssl: false,
            allow_redirects: true,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedConfig {
    /// Pause between two probes, in seconds
    pub delay_between_requests: f64,
    pub blacklist_domains: Vec<String>,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            delay_between_requests: 1.0,
            blacklist_domains: vec![
                "google.com".to_string(),
                "facebook.com".to_string(),
                "twitter.com".to_string(),
            ],
        }
    }
}

/// Values given on the command line; `None`/`false` leaves the file value alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub timeout: Option<f64>,
    pub max_apis: Option<usize>,
    pub delay: Option<f64>,
    pub blacklist: Vec<String>,
    pub verify_tls: bool,
    pub no_redirects: bool,
    pub user_agent: Option<String>,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(timeout) = overrides.timeout {
            self.api_detection.timeout = timeout;
        }
        if let Some(max_apis) = overrides.max_apis {
            self.api_detection.max_apis_per_scan = max_apis;
        }
        if let Some(delay) = overrides.delay {
            self.advanced.delay_between_requests = delay;
        }
        self.advanced.blacklist_domains.extend(overrides.blacklist);
        if overrides.verify_tls {
            self.security.verify_ssl = true;
        }
        if overrides.no_redirects {
            self.security.allow_redirects = false;
        }
        if let Some(user_agent) = overrides.user_agent {
            self.browser.user_agent = user_agent;
        }
        debug!("Effective configuration: {:?}", self);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeout()?;
        if self.api_detection.max_apis_per_scan == 0 {
            return Err(ConfigError::Invalid(
                "api_detection.max_apis_per_scan must be greater than 0".to_string(),
            ));
        }
        self.delay()?;
        Ok(())
    }

    fn timeout(&self) -> Result<Duration, ConfigError> {
        match Duration::try_from_secs_f64(self.api_detection.timeout) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => Err(ConfigError::Invalid(format!(
                "api_detection.timeout must be a positive number of seconds, got {}",
                self.api_detection.timeout
            ))),
        }
    }

    fn delay(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.advanced.delay_between_requests).map_err(|_| {
            ConfigError::Invalid(format!(
                "advanced.delay_between_requests must be a non-negative number of seconds, got {}",
                self.advanced.delay_between_requests
            ))
        })
    }

    pub fn probe_options(&self) -> Result<ProbeOptions, ConfigError> {
        self.validate()?;

        Ok(ProbeOptions {
            timeout: self.timeout()?,
            max_count: self.api_detection.max_apis_per_scan,
            delay: self.delay()?,
            verify_tls: self.security.verify_ssl,
            follow_redirects: self.security.allow_redirects,
            max_redirects: self.security.max_redirects,
        })
    }

    pub fn header_profile(&self) -> HeaderProfile {
        HeaderProfile::new(self.browser.user_agent.clone())
    }
}
