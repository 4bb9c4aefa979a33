//! Service configuration
//!
//! Loaded from TOML with the following structure:
//!
//! ```toml
//! [server]
//! addr = "127.0.0.1:8000"
//!
//! [model]
//! path = "models/sber_auto_model.json"
//! ```
//!
//! Lookup order: `$PREDICT_CONFIG` (must exist), `./predict.toml`, then
//! `predict/predict.toml` under the user config directory. Without any file
//! the defaults apply. `PREDICT_ADDR` and `PREDICT_MODEL_PATH` override
//! whatever was loaded.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "PREDICT_CONFIG";
pub const ADDR_ENV: &str = "PREDICT_ADDR";
pub const MODEL_PATH_ENV: &str = "PREDICT_MODEL_PATH";

const CONFIG_FILE: &str = "predict.toml";

/// Top-level service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:8000".to_string()
}

/// Model bundle location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Bundle path; relative paths resolve against the working directory
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models").join("sber_auto_model.json")
}

impl ServiceConfig {
    /// Load using the standard lookup order and environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match Self::standard_locations().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(
            std::env::var(ADDR_ENV).ok(),
            std::env::var_os(MODEL_PATH_ENV).map(PathBuf::from),
        );
        config.validate()?;
        Ok(config)
    }

    /// Candidate config files, most specific first
    pub fn standard_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("predict").join(CONFIG_FILE));
        }
        paths
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Replace file values with explicit overrides
    pub fn apply_overrides(&mut self, addr: Option<String>, model_path: Option<PathBuf>) {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if let Some(path) = model_path {
            self.model.path = path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.model.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "model.path".to_string(),
                message: "path is empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "server.addr".to_string(),
                message: e.to_string(),
            })
    }

    /// Bundle path, absolute
    pub fn model_path(&self) -> PathBuf {
        if self.model.path.is_absolute() {
            self.model.path.clone()
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(&self.model.path))
                .unwrap_or_else(|_| self.model.path.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.addr, "127.0.0.1:8000");
        assert_eq!(
            config.model.path,
            PathBuf::from("models/sber_auto_model.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ServiceConfig::from_toml("[server]\naddr = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn test_empty_toml() {
        assert_eq!(
            ServiceConfig::from_toml("").unwrap(),
            ServiceConfig::default()
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = ServiceConfig::from_toml("[server\naddr = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = ServiceConfig::from_toml(
            "[server]\naddr = \"0.0.0.0:9000\"\n[model]\npath = \"/srv/a.json\"\n",
        )
        .unwrap();
        config.apply_overrides(
            Some("127.0.0.1:7000".to_string()),
            Some(PathBuf::from("/srv/b.json")),
        );
        assert_eq!(config.server.addr, "127.0.0.1:7000");
        assert_eq!(config.model.path, PathBuf::from("/srv/b.json"));

        config.apply_overrides(None, None);
        assert_eq!(config.server.addr, "127.0.0.1:7000");
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = ServiceConfig::default();
        config.server.addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "server.addr"));
    }

    #[test]
    fn test_relative_model_path_resolves_to_cwd() {
        let config = ServiceConfig::default();
        let resolved = config.model_path();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("models/sber_auto_model.json"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\npath = \"/opt/model.json\"").unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.path, PathBuf::from("/opt/model.json"));
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceConfig::from_file(&dir.path().join("predict.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
