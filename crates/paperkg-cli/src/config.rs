//! Settings resolution: defaults, then TOML file, then environment.
//!
//! Command-line flags are applied last by the individual commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paperkg_graph::GraphConfig;
use serde::Deserialize;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "paperkg.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub neo4j: GraphConfig,
    pub redis: RedisSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Resolve settings from `path` (or `paperkg.toml` if present) and the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };

        let mut settings = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Override fields from environment variables looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("NEO4J_URI") {
            self.neo4j.uri = v;
        }
        if let Some(v) = var("NEO4J_USER") {
            self.neo4j.user = v;
        }
        if let Some(v) = var("NEO4J_PASSWORD") {
            self.neo4j.password = v;
        }
        if let Some(v) = var("NEO4J_DATABASE") {
            self.neo4j.database = v;
        }
        if let Some(v) = var("REDIS_URL") {
            self.redis.url = v;
        }
        if let Some(v) = var("PAPERKG_HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PAPERKG_PORT") {
            self.server.port = v
                .parse()
                .with_context(|| format!("PAPERKG_PORT is not a valid port: {}", v))?;
        }
        if let Some(v) = var("PAPERKG_DEBUG") {
            self.server.debug = parse_flag(&v)
                .with_context(|| format!("PAPERKG_DEBUG is not a boolean: {}", v))?;
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.redis.url, "redis://127.0.0.1:6379/0");
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8000);
        assert!(!settings.server.debug);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [neo4j]
            uri = "bolt://graph:7687"
            password = "secret"

            [server]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(settings.neo4j.uri, "bolt://graph:7687");
        assert_eq!(settings.neo4j.password, "secret");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.redis.url, "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut settings = Settings::from_toml("[server]\nport = 9000\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("PAPERKG_PORT", "9100"),
            ("PAPERKG_DEBUG", "true"),
            ("REDIS_URL", "redis://cache:6379/1"),
        ]
        .into_iter()
        .collect();

        settings
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.server.port, 9100);
        assert!(settings.server.debug);
        assert_eq!(settings.redis.url, "redis://cache:6379/1");
    }

    #[test]
    fn test_invalid_env_values_are_errors() {
        let mut settings = Settings::default();
        assert!(settings
            .apply_env(|k| (k == "PAPERKG_PORT").then(|| "eighty".to_string()))
            .is_err());
        assert!(settings
            .apply_env(|k| (k == "PAPERKG_DEBUG").then(|| "maybe".to_string()))
            .is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/paperkg.toml"))).is_err());
    }
}
