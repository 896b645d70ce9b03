//! Graph build configuration.
//!
//! [`GraphConfig`] is plain data: seeds and parser switches. It can be built
//! in code or layered from defaults, an `esgraph.toml` (or `.json`) file and
//! `ESGRAPH_*` environment variables.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hooks::DEFAULT_EXTENSIONS;
use crate::parse::ParseOptions;

/// File looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "esgraph.toml";

/// Prefix of environment variables overriding config values.
pub const ENV_PREFIX: &str = "ESGRAPH_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("empty path in `{0}`")]
    EmptyPath(&'static str),
}

/// What to traverse and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Seed modules, relative to the runtime cwd.
    pub modules: Vec<String>,
    /// Directories walked recursively; every module found is a seed.
    pub directories: Vec<String>,
    /// Treat `import('x')` with a static string as a namespace import.
    pub include_dynamic_imports: bool,
    /// Treat `require('x')` with a static string as a namespace import.
    pub include_requires: bool,
    /// Extensions probed by the default module choosers.
    pub extensions: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            directories: Vec::new(),
            include_dynamic_imports: false,
            include_requires: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl GraphConfig {
    /// Load configuration from multiple sources.
    /// Priority: environment variables > config file > defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        if let Some(path) = config_file {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                other => {
                    return Err(ConfigError::UnsupportedFormat(
                        other.unwrap_or_default().to_string(),
                    ));
                }
            };
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.iter().any(|path| path.trim().is_empty()) {
            return Err(ConfigError::EmptyPath("modules"));
        }
        if self.directories.iter().any(|path| path.trim().is_empty()) {
            return Err(ConfigError::EmptyPath("directories"));
        }
        if self.extensions.iter().any(|ext| ext.is_empty() || ext.starts_with('.')) {
            return Err(ConfigError::InvalidValue(
                "extensions are written without a leading dot".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            include_dynamic_imports: self.include_dynamic_imports,
            include_requires: self.include_requires,
        }
    }
}
