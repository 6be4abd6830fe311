//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Movie catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Movie catalog (TMDb) configuration.
///
/// When no read token or API key is set, the built-in demo catalog is used.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// TMDb v4 read access token.
    #[serde(default)]
    pub tmdb_read_token: Option<String>,
    /// TMDb v3 API key (used when no read token is set).
    #[serde(default)]
    pub tmdb_api_key: Option<String>,
    /// Region for watch-provider lookups.
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            tmdb_read_token: None,
            tmdb_api_key: None,
            region: default_region(),
        }
    }
}

impl CatalogConfig {
    /// Whether TMDb credentials are configured.
    #[must_use]
    pub const fn tmdb_configured(&self) -> bool {
        self.tmdb_read_token.is_some() || self.tmdb_api_key.is_some()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_region() -> String {
    "US".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `REELVOTE_ENV`)
    /// 3. Environment variables with `REELVOTE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("REELVOTE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("REELVOTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("REELVOTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_defaults_to_unconfigured() {
        let catalog = CatalogConfig::default();
        assert!(!catalog.tmdb_configured());
    }
}
