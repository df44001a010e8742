// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration persistence for kubescout
//!
//! All kubescout data is stored under ~/.kubescout/:
//! - ~/.kubescout/config.json - user configuration
//! - ~/.kubescout/log/ - rotated log files

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::kubernetes::ConnectionOptions;

/// Get the base kubescout directory (~/.kubescout/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".kubescout"))
        .context("Could not determine home directory")
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// kubescout configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Kubeconfig path; when unset, KUBECONFIG then ~/.kube/config
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Check the API server is reachable when connecting to a context
    #[serde(default = "default_true")]
    pub verify_connection: bool,
    /// Use the service account when running inside a pod
    #[serde(default)]
    pub prefer_in_cluster: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            verify_connection: true,
            prefer_in_cluster: false,
        }
    }
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the config file path (~/.kubescout/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            verify: self.verify_connection,
            prefer_in_cluster: self.prefer_in_cluster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.kubeconfig.is_none());
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.read_timeout_secs, 30);
        assert!(config.verify_connection);
        assert!(!config.prefer_in_cluster);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let json = r#"{"kubeconfig": "/etc/kube/config", "read_timeout_secs": 5}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/etc/kube/config")));
        assert_eq!(config.read_timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_connection_options() {
        let config = Config {
            connect_timeout_secs: 3,
            verify_connection: false,
            ..Default::default()
        };
        let options = config.connection_options();
        assert_eq!(options.connect_timeout, Duration::from_secs(3));
        assert_eq!(options.read_timeout, Duration::from_secs(30));
        assert!(!options.verify);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"kubeconfig": "/tmp/kubeconfig", "prefer_in_cluster": true}"#,
        )
        .unwrap();

        let loaded = Config::load_from(&config_path).unwrap();
        assert_eq!(loaded.kubeconfig, Some(PathBuf::from("/tmp/kubeconfig")));
        assert!(loaded.prefer_in_cluster);
        assert!(loaded.verify_connection);
    }

    #[test]
    fn test_config_load_missing_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_config_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
