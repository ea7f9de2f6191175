// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use stutask_core::domain::config::MarketplaceConfig;

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
pub const ANNOTATED_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the resolved manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./stutask-config.yaml)
        #[arg(short, long, default_value = "./stutask-config.yaml")]
        output: PathBuf,

        /// Include comments for every setting
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = MarketplaceConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. STUTASK_CONFIG_PATH: {}",
            std::env::var("STUTASK_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./stutask-config.yaml");
        println!("  4. ~/.stutask/config.yaml");
        println!("  5. /etc/stutask/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config).context("Failed to render configuration")?);
        return Ok(());
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    println!("{}", "Payments:".bold());
    println!("  Partial rate: {}", spec.payments.partial_rate);
    println!("  Default currency: {}", spec.payments.default_currency);
    println!();

    println!("{}", "Chat:".bold());
    println!("  Page size: {}", spec.chat.page_size);
    println!();

    println!("{}", "Applications:".bold());
    println!("  Max links: {}", spec.applications.max_links);
    println!();

    println!("{}", "Events:".bold());
    println!("  Capacity: {}", spec.events.capacity);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = MarketplaceConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    let sample = if with_examples { ANNOTATED_TEMPLATE } else { MINIMAL_TEMPLATE };

    std::fs::write(output, sample).with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in [MINIMAL_TEMPLATE, ANNOTATED_TEMPLATE] {
            let config = MarketplaceConfig::from_yaml_str(template).unwrap();
            config.validate().unwrap();
            assert_eq!(config.spec.payments.partial_rate, Decimal::new(25, 2));
            assert_eq!(config.spec.payments.default_currency, "IDR");
        }
    }

    #[tokio::test]
    async fn test_generate_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("stutask-config.yaml");

        generate(&output, true).await.unwrap();

        let config = MarketplaceConfig::from_yaml_file(&output).unwrap();
        assert_eq!(config.spec.chat.page_size, 50);
        validate(Some(output)).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            MINIMAL_TEMPLATE.replace("partial_rate: 0.25", "partial_rate: 1.5"),
        )
        .unwrap();

        assert!(validate(Some(path)).await.is_err());
    }
}
