//! Configuration file handling

use serde::Deserialize;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default probe target
    #[serde(default)]
    pub target: TargetConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Receive limits
    #[serde(default)]
    pub limits: Limits,
}

/// Default probe target
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    /// Host the server listens on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the server listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4120
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Per-exchange timeout; 0 disables the timeout
    #[serde(default = "default_exchange")]
    pub exchange_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            exchange_secs: default_exchange(),
        }
    }
}

fn default_exchange() -> u64 {
    30
}

/// Receive limits
#[derive(Debug, Deserialize)]
pub struct Limits {
    /// Maximum bytes read from a reply; longer replies are truncated here
    #[serde(default = "default_max_reply_bytes")]
    pub max_reply_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_reply_bytes: default_max_reply_bytes(),
        }
    }
}

fn default_max_reply_bytes() -> usize {
    64 * 1024
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                return toml::from_str(&content)
                    .map_err(|e| super::Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target.host, "127.0.0.1");
        assert_eq!(config.target.port, 4120);
        assert_eq!(config.timeouts.exchange_secs, 30);
        assert_eq!(config.limits.max_reply_bytes, 64 * 1024);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [target]
            port = 3000
            "#,
        )
        .unwrap();
        assert_eq!(config.target.port, 3000);
        assert_eq!(config.target.host, "127.0.0.1");
        assert_eq!(config.timeouts.exchange_secs, 30);
    }
}
