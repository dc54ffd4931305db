use crate::builder::DEFAULT_EXTENSION;
use crate::component::Imports;
use crate::error::{RegistryError, RegistryErrorExt};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `AUTOLOAD__COMPONENTS_PATH`.
pub const ENV_PREFIX: &str = "AUTOLOAD";

/// Construction input of a registry.
///
/// `components_path` defaults to the empty string, which fails validation: a registry
/// needs an explicit directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub components_path: String,
    pub imports: Imports,
    /// Extension of loadable units, without the leading dot.
    pub extension: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            components_path: String::new(),
            imports: Imports::default(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }
}

/// Loads a [`RegistryConfig`] from a file with environment overrides on top.
///
/// 1. **Base File**: the given path, or `autoload` in the working directory. The format is
///    inferred from the extension (`toml`, `json`, `yaml`, ...).
/// 2. **Environment Overrides**: variables prefixed with `AUTOLOAD__`; nested keys use
///    double underscores (`AUTOLOAD__IMPORTS__REGION` maps to `imports.region`).
///
/// # Errors
///
/// Returns [`RegistryError::Config`] if the file is missing or the merged settings do not
/// match [`RegistryConfig`].
///
/// # Example
///
/// ```rust,no_run
/// use autoload::load_config;
///
/// let config = load_config(Some("config/autoload.toml")).unwrap_or_default();
/// ```
pub fn load_config(path: Option<impl AsRef<Path>>) -> Result<RegistryConfig, RegistryError> {
    load_with_env(path, None)
}

/// Same as [`load_config`], reading overrides from `env` instead of the process environment
/// when given.
fn load_with_env(
    path: Option<impl AsRef<Path>>,
    env: Option<Map<String, String>>,
) -> Result<RegistryConfig, RegistryError> {
    let effective_path =
        path.map_or_else(|| PathBuf::from("autoload"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .source(env),
        );

    info!("Loading registry config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build registry config")?
        .try_deserialize::<RegistryConfig>()
        .context("Failed to deserialize registry config")?;

    Ok(config)
}
