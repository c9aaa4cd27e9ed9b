//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./outbound.toml or ./.outbound/config.toml
//! 2. User config: ~/.outbound/config.toml
//! 3. System config: /etc/outbound/config.toml
//! 4. Built-in defaults (no services registered)
//!
//! Credentials can always be supplied through the environment instead of the
//! file: `SHOPIFY_ACCESS_TOKEN`, `PUBLER_API_KEY` and
//! `CHATWOOT_API_ACCESS_TOKEN` override the corresponding file values.

use crate::integration::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundConfig {
    #[serde(default)]
    pub services: GatewayConfig,
}

impl OutboundConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: OutboundConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Let environment variables take precedence over file-sourced secrets.
    /// Only services present in the config are touched.
    pub fn apply_env_overrides(&mut self) {
        if let (Ok(token), Some(shopify)) = (
            std_env::var("SHOPIFY_ACCESS_TOKEN"),
            self.services.shopify.as_mut(),
        ) {
            shopify.access_token = token;
        }
        if let (Ok(key), Some(publer)) = (
            std_env::var("PUBLER_API_KEY"),
            self.services.publer.as_mut(),
        ) {
            publer.api_key = key;
        }
        if let (Ok(token), Some(chatwoot)) = (
            std_env::var("CHATWOOT_API_ACCESS_TOKEN"),
            self.services.chatwoot.as_mut(),
        ) {
            chatwoot.api_access_token = token;
        }
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy, with environment
    /// overrides applied
    pub fn discover_config() -> Result<OutboundConfig, Box<dyn std::error::Error>> {
        let mut config = if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            OutboundConfig::from_toml_file(config_path)?
        } else {
            info!("No configuration file found, using defaults");
            OutboundConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::get_config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.exists() && candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // 1. Current directory: ./outbound.toml
        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join("outbound.toml"));
            candidates.push(current_dir.join(".outbound").join("config.toml"));
        }

        // 2. User config: ~/.outbound/config.toml
        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(home_dir.join(".outbound").join("config.toml"));
        }

        // 3. System config: /etc/outbound/config.toml (Unix-like systems)
        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/outbound/config.toml"));

        // Windows system config: C:\ProgramData\outbound\config.toml
        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("outbound")
                    .join("config.toml"),
            );
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        if let Some(found) = Self::find_config_file() {
            println!("Active configuration: {:?}", found);
        } else {
            println!("Active configuration: Built-in defaults");
        }
    }
}
