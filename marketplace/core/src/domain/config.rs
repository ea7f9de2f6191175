// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Marketplace Configuration
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) holding the
// tunables of the lifecycle engine and the payment protocol:
// - payment split and fallback currency
// - chat page size
// - application link limit
// - event bus capacity

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::payment::PaymentTerms;

pub const API_VERSION: &str = "stutask.app/v1";
pub const KIND: &str = "MarketplaceConfig";

/// Top-level configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// API version (must be "stutask.app/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "MarketplaceConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: MarketplaceSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Deployment name, e.g. "campus-prod"
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceSpec {
    #[serde(default)]
    pub payments: PaymentsConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub applications: ApplicationsConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Share of the agreed price paid upfront (0 < rate < 1)
    #[serde(default = "default_partial_rate")]
    pub partial_rate: Decimal,

    /// Currency used when neither the proposal nor the job names one
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_partial_rate() -> Decimal {
    Decimal::new(25, 2)
}

fn default_currency() -> String {
    "IDR".to_string()
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            partial_rate: default_partial_rate(),
            default_currency: default_currency(),
        }
    }
}

impl PaymentsConfig {
    pub fn terms(&self) -> PaymentTerms {
        PaymentTerms::new(self.partial_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages per history page; the live window covers one page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    50
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationsConfig {
    /// Portfolio links kept per application
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

fn default_max_links() -> usize {
    2
}

impl Default for ApplicationsConfig {
    fn default() -> Self {
        Self {
            max_links: default_max_links(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1000
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "stutask".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: MarketplaceSpec::default(),
        }
    }
}

impl MarketplaceConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. STUTASK_CONFIG_PATH environment variable
    /// 2. ./stutask-config.yaml (working directory)
    /// 3. ~/.stutask/config.yaml (user home)
    /// 4. /etc/stutask/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("STUTASK_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./stutask-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".stutask").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/stutask/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STUTASK_DEFAULT_CURRENCY") {
            let currency = val.trim().to_uppercase();
            if currency.is_empty() {
                tracing::warn!("Ignoring empty STUTASK_DEFAULT_CURRENCY");
            } else {
                tracing::info!("Environment override: STUTASK_DEFAULT_CURRENCY={}", currency);
                self.spec.payments.default_currency = currency;
            }
        }

        if let Ok(val) = std::env::var("STUTASK_CHAT_PAGE_SIZE") {
            match val.trim().parse::<usize>() {
                Ok(size) => {
                    tracing::info!("Environment override: STUTASK_CHAT_PAGE_SIZE={}", size);
                    self.spec.chat.page_size = size;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for STUTASK_CHAT_PAGE_SIZE: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let rate = self.spec.payments.partial_rate;
        if rate <= Decimal::ZERO || rate >= Decimal::ONE {
            anyhow::bail!("spec.payments.partial_rate must be between 0 and 1 (exclusive), got {}", rate);
        }

        if self.spec.payments.default_currency.trim().is_empty() {
            anyhow::bail!("spec.payments.default_currency cannot be empty");
        }

        if self.spec.chat.page_size == 0 {
            anyhow::bail!("spec.chat.page_size must be at least 1");
        }

        if self.spec.events.capacity == 0 {
            anyhow::bail!("spec.events.capacity must be at least 1");
        }

        Ok(())
    }
}
