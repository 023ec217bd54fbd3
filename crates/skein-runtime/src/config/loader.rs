//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Profile-specific file (`skein.{profile}.toml` / `skein.{profile}.yaml`)
//! 3. Main file (`skein.toml` / `skein.yaml`, falling back to `config.*`)
//! 4. Environment variables (`SKEIN_*`)
//! 5. Programmatic overrides passed to [`ConfigLoader::merge`] or
//!    [`ConfigLoader::merge_provider`]
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML files
//! - `yaml-config`: YAML files
//!
//! # Environment Variable Mapping
//!
//! Nested keys are separated by `__`:
//!
//! - `SKEIN_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `SKEIN_CHAIN__MAX_DEPTH=16` → `chain.max_depth = 16`
//!
//! # Example
//!
//! ```rust,ignore
//! use skein_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/skein.toml")
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use figment::Provider;
use serde_json::Value as JsonValue;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::SkeinConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "SKEIN_";
const PROFILE_VAR: &str = "SKEIN_PROFILE";
const APP_DIR: &str = "skein";

/// Configuration profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Any other profile name.
    Custom(String),
}

impl Profile {
    /// Parses a profile name, accepting the `dev` and `prod` short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Returns the profile name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Reads `SKEIN_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Override {
    Config(SkeinConfig),
    Provider(Figment),
}

/// Multi-source configuration loader.
pub struct ConfigLoader {
    overrides: Vec<Override>,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the default locations and reads the
    /// environment.
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    ///
    /// When no search path is given, the current directory and the user
    /// config directory (`~/.config/skein` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a configuration over every other source.
    ///
    /// Only fields that differ from [`SkeinConfig::default`] are layered, so
    /// file and environment values survive for everything left at its
    /// default. Use [`merge_provider`](Self::merge_provider) to force a value
    /// back to its default.
    pub fn merge(mut self, config: SkeinConfig) -> Self {
        self.overrides.push(Override::Config(config));
        self
    }

    /// Merges an arbitrary figment provider over every other source.
    ///
    /// ```rust,ignore
    /// use figment::providers::Serialized;
    ///
    /// let config = ConfigLoader::new()
    ///     .merge_provider(Serialized::default("logging.level", "info"))
    ///     .load()?;
    /// ```
    pub fn merge_provider(mut self, provider: impl Provider) -> Self {
        self.overrides
            .push(Override::Provider(Figment::from(provider)));
        self
    }

    /// Loads, extracts and validates the configuration.
    pub fn load(self) -> ConfigResult<SkeinConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: SkeinConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            max_depth = ?config.chain.max_depth,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SkeinConfig::default()));

        match &self.config_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_config_file(figment, path)?;
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => figment = self.load_config_files(figment),
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        for layer in self.overrides {
            figment = match layer {
                Override::Config(config) => match changed_fields(&config)? {
                    Some(changed) => figment.merge(Serialized::defaults(changed)),
                    None => figment,
                },
                Override::Provider(provider) => figment.merge(provider),
            };
        }

        Ok(figment)
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR));
        }
        paths
    }

    /// Stops at the first directory holding a base file; its profile variant
    /// is merged first so the base file wins.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[(&str, &str)],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for dir in search_paths {
            for (stem, ext) in base_names {
                let profile_path = dir.join(format!("{stem}.{}.{ext}", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = dir.join(format!("{stem}.{ext}"));
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &[("skein", "toml"), ("config", "toml")],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &[
                    ("skein", "yaml"),
                    ("skein", "yml"),
                    ("config", "yaml"),
                    ("config", "yml"),
                ],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Returns the parts of `config` that differ from the defaults, or `None`
/// when nothing differs.
fn changed_fields(config: &SkeinConfig) -> ConfigResult<Option<JsonValue>> {
    let to_json =
        |c: &SkeinConfig| serde_json::to_value(c).map_err(|e| ConfigError::ParseError(e.to_string()));

    Ok(diff(to_json(config)?, &to_json(&SkeinConfig::default())?))
}

fn diff(value: JsonValue, base: &JsonValue) -> Option<JsonValue> {
    match (value, base) {
        (JsonValue::Object(fields), JsonValue::Object(base_fields)) => {
            let changed: serde_json::Map<String, JsonValue> = fields
                .into_iter()
                .filter_map(|(key, v)| match base_fields.get(&key) {
                    Some(b) => diff(v, b).map(|v| (key, v)),
                    None => Some((key, v)),
                })
                .collect();
            (!changed.is_empty()).then_some(JsonValue::Object(changed))
        }
        (value, base) => (value != *base).then_some(value),
    }
}

/// Merges a single file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<SkeinConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from one file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<SkeinConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, LogLevel, LoggingConfig};
    use figment::Jail;

    fn jailed<F>(f: F)
    where
        F: FnOnce(&mut Jail) -> ConfigResult<()>,
    {
        Jail::expect_with(|jail| f(jail).map_err(|e| e.to_string().into()));
    }

    #[test]
    fn test_default_config() {
        jailed(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()?;

            assert_eq!(config.logging.level, LogLevel::Info);
            assert_eq!(config.chain.max_depth, None);
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }

    #[test]
    fn test_profile_from_env() {
        jailed(|jail| {
            jail.set_env(PROFILE_VAR, "production");
            assert_eq!(Profile::from_env(), Profile::Production);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_layering() {
        jailed(|jail| {
            jail.create_file(
                "skein.development.toml",
                "[logging]\nlevel = \"trace\"\nthread_ids = true\n",
            )
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            jail.create_file("skein.toml", "[logging]\nlevel = \"warn\"\n[chain]\nmax_depth = 4\n")
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            jail.set_env("SKEIN_CHAIN__MAX_DEPTH", "8");

            let config = ConfigLoader::new()
                .profile("dev")
                .search_path(jail.directory())
                .load()?;

            assert_eq!(config.logging.level, LogLevel::Warn);
            assert!(config.logging.thread_ids);
            assert_eq!(config.chain.max_depth, Some(8));
            Ok(())
        });
    }

    #[test]
    fn test_merge_overrides_env() {
        jailed(|jail| {
            jail.set_env("SKEIN_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(SkeinConfig {
                    logging: LoggingConfig {
                        level: LogLevel::Debug,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .load()?;

            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_merge_keeps_file_and_env_values() {
        jailed(|jail| {
            jail.create_file(
                "skein.toml",
                "[logging]\nthread_ids = true\nmax_files = 9\n[chain]\nmax_depth = 4\n",
            )
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            jail.set_env("SKEIN_LOGGING__FORMAT", "pretty");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(SkeinConfig {
                    logging: LoggingConfig {
                        level: LogLevel::Debug,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .load()?;

            assert_eq!(config.logging.level, LogLevel::Debug);
            assert!(config.logging.thread_ids);
            assert_eq!(config.logging.max_files, 9);
            assert_eq!(config.logging.format, LogFormat::Pretty);
            assert_eq!(config.chain.max_depth, Some(4));
            Ok(())
        });
    }

    #[test]
    fn test_merge_provider_can_restore_default() {
        jailed(|jail| {
            jail.set_env("SKEIN_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge_provider(Serialized::default("logging.level", "info"))
                .load()?;

            assert_eq!(config.logging.level, LogLevel::Info);
            Ok(())
        });
    }

    #[test]
    fn test_default_merge_layers_nothing() {
        assert!(changed_fields(&SkeinConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/skein.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_invalid_value_is_rejected() {
        jailed(|jail| {
            jail.create_file("skein.toml", "[chain]\nmax_depth = 0\n")
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;

            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));
            Ok(())
        });
    }
}
