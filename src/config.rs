//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/boardtree/boardtree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `BOARDTREE_*` prefix, `__` between sections
//!    (e.g. `BOARDTREE_FETCH__LATENCY_MS=50`, `BOARDTREE_FETCH__FAIL_IDS=1-1,1-2`)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::normalize_label;

/// Behaviour of the mock child source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    /// Simulated latency per fetch
    pub latency_ms: u64,
    /// Fetches slower than this fail with a timeout
    pub timeout_ms: u64,
    /// Node ids whose fetch always fails
    pub fail_ids: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            latency_ms: 500,
            timeout_ms: 5_000,
            fail_ids: vec![],
        }
    }
}

/// Labels used when the user adds an item without naming it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub card_title: String,
    pub node_name: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            card_title: "New Task".into(),
            node_name: "New Node".into(),
        }
    }
}

/// Unified configuration for boardtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchConfig,
    pub defaults: DefaultsConfig,
}

/// Get the XDG config directory for boardtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "boardtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("boardtree.toml"))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    pub fn fetch_latency(&self) -> Duration {
        Duration::from_millis(self.fetch.latency_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch.timeout_ms)
    }

    /// Load settings with layered precedence from the real environment.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file that must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_layers(global.as_deref(), explicit, None)
    }

    /// Load settings from explicit layers.
    ///
    /// `env` replaces the process environment as the source of `BOARDTREE_*`
    /// variables when given; tests use it to avoid touching global state.
    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut builder =
            Config::builder().add_source(Config::try_from(&Settings::default()).map_err(config_err)?);

        // 2. Global config (optional)
        if let Some(path) = global {
            builder = builder.add_source(File::from(path).required(false));
        }

        // 3. Explicit config (required)
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            builder = builder.add_source(File::from(path).required(true));
        }

        // 4. Environment variables (explicit override)
        let mut environment = Environment::with_prefix("BOARDTREE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("fetch.fail_ids");
        if let Some(vars) = env {
            environment = environment.source(Some(vars.into_iter().collect()));
        }
        builder = builder.add_source(environment);

        let settings: Self = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ApplicationError::Config {
                message: "fetch.timeout_ms must be greater than 0".into(),
            });
        }
        for (key, value) in [
            ("defaults.card_title", &self.defaults.card_title),
            ("defaults.node_name", &self.defaults.node_name),
        ] {
            normalize_label("label", value).map_err(|_| ApplicationError::Config {
                message: format!("{} must not be empty", key),
            })?;
        }
        Ok(())
    }

    /// Render as TOML, the format of the config files.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
