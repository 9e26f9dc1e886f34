//! TOML-based application configuration.
//!
//! Stores:
//! - Where the SQLite database lives
//! - Default log filter for the CLI
//! - Defaults applied by `habit create` when flags are omitted
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::habit::Periodicity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File name (relative to the data directory) or absolute path.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when no env override is set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_periodicity")]
    pub periodicity: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

fn default_database_file() -> String {
    "habitrack.db".into()
}
fn default_log_level() -> String {
    "warn".into()
}
fn default_periodicity() -> String {
    "daily".into()
}
fn default_duration() -> u32 {
    1
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            periodicity: default_periodicity(),
            duration: default_duration(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => {
                        serde_json::Value::Bool(value.parse::<bool>().map_err(|_| {
                            ConfigError::ParseFailed(format!("cannot parse '{value}' as bool"))
                        })?)
                    }
                    serde_json::Value::Number(_) => {
                        let n = value.parse::<u64>().map_err(|_| {
                            ConfigError::ParseFailed(format!("cannot parse '{value}' as number"))
                        })?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of `config.toml`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// The new value takes the type of the current one. Setting
    /// `defaults.periodicity` to anything but daily/weekly is rejected.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let next: Config = serde_json::from_value(json)?;
        next.default_periodicity()?;
        *self = next;
        Ok(())
    }

    /// Set a value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Resolved path of the SQLite database file.
    pub fn database_path(&self) -> Result<PathBuf> {
        let file = PathBuf::from(&self.storage.database_file);
        if file.is_absolute() {
            Ok(file)
        } else {
            Ok(data_dir()?.join(file))
        }
    }

    pub fn default_periodicity(&self) -> Result<Periodicity> {
        Ok(self.defaults.periodicity.parse::<Periodicity>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage.database_file, "habitrack.db");
        assert_eq!(parsed.logging.level, "warn");
        assert_eq!(parsed.defaults.duration, 1);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(parsed.logging.level, "debug");
        assert_eq!(parsed.defaults.periodicity, "daily");
        assert_eq!(parsed.storage.database_file, "habitrack.db");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("logging.level").as_deref(), Some("warn"));
        assert_eq!(cfg.get("defaults.duration").as_deref(), Some("1"));
        assert!(cfg.get("defaults").is_none());
        assert!(cfg.get("logging.missing").is_none());
    }

    #[test]
    fn set_value_is_typed_by_existing_value() {
        let mut cfg = Config::default();
        cfg.set_value("defaults.duration", "7").unwrap();
        assert_eq!(cfg.defaults.duration, 7);

        assert!(cfg.set_value("defaults.duration", "seven").is_err());
        assert!(cfg.set_value("defaults.nope", "1").is_err());
        assert!(cfg.set_value("", "1").is_err());
    }

    #[test]
    fn default_periodicity_must_be_known() {
        let mut cfg = Config::default();
        cfg.set_value("defaults.periodicity", "weekly").unwrap();
        assert_eq!(cfg.default_periodicity().unwrap(), Periodicity::Weekly);

        assert!(cfg.set_value("defaults.periodicity", "monthly").is_err());
        assert_eq!(cfg.defaults.periodicity, "weekly");
    }
}
