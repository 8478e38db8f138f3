//! Tree settings with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Settings file (TOML), if given
//! 3. Environment variables: `MARKEDTREE_*` prefix

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::mark::{Mark, DEFAULT_MARK_CEILING};
use crate::errors::{SettingsError, SettingsResult};

/// Construction settings for a [`MarkedTree`](crate::MarkedTree).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeSettings {
    /// Highest mark the tree may hand out; adds beyond it fail
    pub mark_ceiling: Mark,
    /// Node slots reserved up front
    pub initial_capacity: usize,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            mark_ceiling: DEFAULT_MARK_CEILING,
            initial_capacity: 16,
        }
    }
}

impl TreeSettings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `path` - Optional TOML settings file; it must exist when given
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        let mut builder = Self::defaults_builder()?;

        if let Some(path) = path {
            if !path.exists() {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                });
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(Environment::with_prefix("MARKEDTREE").try_parsing(true));

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        debug!(?settings, "loaded tree settings");
        Ok(settings)
    }

    /// Parse settings from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| SettingsError::Parse {
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> SettingsResult<()> {
        if self.mark_ceiling == 0 {
            return Err(SettingsError::Invalid {
                message: "mark_ceiling must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective settings as TOML.
    pub fn to_toml(&self) -> SettingsResult<String> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize {
            message: e.to_string(),
        })
    }

    /// Generate a template settings file.
    pub fn template() -> String {
        r#"# markedtree settings
#
# Precedence (lowest to highest):
#   compiled defaults, this file, MARKEDTREE_* environment variables

# Highest mark a tree hands out before adds fail
# mark_ceiling = 9223372036854775807

# Node slots reserved when a tree is created
# initial_capacity = 16
"#
        .to_string()
    }

    fn defaults_builder() -> SettingsResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        Config::builder()
            .set_default("mark_ceiling", defaults.mark_ceiling)
            .map_err(config_err)?
            .set_default("initial_capacity", defaults.initial_capacity as u64)
            .map_err(config_err)
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError::Parse {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_file_when_loading_then_uses_defaults() {
        let settings = TreeSettings::load(None).expect("load defaults");
        assert_eq!(settings, TreeSettings::default());
    }

    #[test]
    fn given_partial_toml_when_parsing_then_missing_keys_default() {
        let settings = TreeSettings::from_toml_str("mark_ceiling = 10\n").unwrap();
        assert_eq!(settings.mark_ceiling, 10);
        assert_eq!(settings.initial_capacity, 16);
    }

    #[test]
    fn given_zero_ceiling_when_parsing_then_rejected() {
        let err = TreeSettings::from_toml_str("mark_ceiling = 0\n").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips() {
        let settings = TreeSettings {
            mark_ceiling: 500,
            initial_capacity: 4,
        };
        let text = settings.to_toml().unwrap();
        assert_eq!(TreeSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let settings = TreeSettings::from_toml_str(&TreeSettings::template()).unwrap();
        assert_eq!(settings, TreeSettings::default());
    }
}
