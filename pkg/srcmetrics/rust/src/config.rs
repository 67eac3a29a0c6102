// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "/etc/srcmetrics/dashboard.yaml";

fn default_proxy_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_prefix() -> String {
    "/web".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_sample_size() -> usize {
    25
}

fn default_max_sample_size() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_sample_size")]
    pub default_sample_size: usize,
    #[serde(default = "default_max_sample_size")]
    pub max_sample_size: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            prefix: default_prefix(),
            timeout_secs: default_timeout_secs(),
            default_sample_size: default_sample_size(),
            max_sample_size: default_max_sample_size(),
            log_level: default_log_level(),
        }
    }
}

pub fn config_path() -> PathBuf {
    std::env::var("SRCMETRICS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the config at `path`, falling back to defaults when the file does not
/// exist, then apply `SRCMETRICS_PROXY_URL` and `SRCMETRICS_PREFIX`.
pub fn load_config(path: &Path) -> Result<DashboardConfig> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        // An empty file is a valid "all defaults" config
        if contents.trim().is_empty() {
            DashboardConfig::default()
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        }
    } else {
        warn!(
            "config file not found at {}, using defaults",
            path.display()
        );
        DashboardConfig::default()
    };

    if let Ok(url) = std::env::var("SRCMETRICS_PROXY_URL") {
        config.proxy_url = url;
    }
    if let Ok(prefix) = std::env::var("SRCMETRICS_PREFIX") {
        config.prefix = prefix;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_env::with_vars_unset(["SRCMETRICS_PROXY_URL", "SRCMETRICS_PREFIX"], || {
            load_config(&dir.path().join("absent.yaml")).unwrap()
        });
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.default_sample_size, 25);
        assert_eq!(config.max_sample_size, 50);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        fs::write(
            &path,
            "proxy_url: http://metrics.example:9000\ndefault_sample_size: 10\n",
        )
        .unwrap();

        let config = temp_env::with_vars_unset(["SRCMETRICS_PROXY_URL", "SRCMETRICS_PREFIX"], || {
            load_config(&path).unwrap()
        });
        assert_eq!(config.proxy_url, "http://metrics.example:9000");
        assert_eq!(config.default_sample_size, 10);
        assert_eq!(config.prefix, "/web");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        fs::write(&path, "\n").unwrap();

        let config = temp_env::with_vars_unset(["SRCMETRICS_PROXY_URL", "SRCMETRICS_PREFIX"], || {
            load_config(&path).unwrap()
        });
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        fs::write(&path, "proxy_url: http://from-file\nprefix: /file\n").unwrap();

        let config = temp_env::with_vars(
            [
                ("SRCMETRICS_PROXY_URL", Some("http://from-env")),
                ("SRCMETRICS_PREFIX", Some("")),
            ],
            || load_config(&path).unwrap(),
        );
        assert_eq!(config.proxy_url, "http://from-env");
        assert_eq!(config.prefix, "");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        fs::write(&path, "timeout_secs: soon\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }

    #[test]
    fn test_config_path_from_env() {
        temp_env::with_var("SRCMETRICS_CONFIG", Some("/tmp/custom.yaml"), || {
            assert_eq!(config_path(), PathBuf::from("/tmp/custom.yaml"));
        });
        temp_env::with_var_unset("SRCMETRICS_CONFIG", || {
            assert_eq!(config_path(), PathBuf::from(DEFAULT_CONFIG_PATH));
        });
    }
}
