use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classify::Classifier;
use crate::error::ConfigError;
use crate::store::FieldNames;

const ENV_PREFIX: &str = "IMAGE_AUDIT";
const DEFAULT_FILE: &str = "image_audit";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite file standing in for the document store credentials.
    pub store_path: PathBuf,
    pub collection: String,
    pub image_field: String,
    pub title_field: String,
    pub deprecated_host_port: String,
    pub current_host_port: String,
}

impl Settings {
    /// Defaults, then the settings file, then `IMAGE_AUDIT_*` variables.
    /// `file` overrides the optional `image_audit.toml` lookup and must exist.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };
        Self::layered(source, Environment::with_prefix(ENV_PREFIX))
    }

    fn layered<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg = Self::defaults()?.add_source(file).add_source(env).build()?;
        Self::from_config(cfg)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("store_path", "data/catalog.sqlite")?
            .set_default("collection", "recipes")?
            .set_default("image_field", "imageUrl")?
            .set_default("title_field", "title")?)
    }

    fn from_config(cfg: Config) -> Result<Self, ConfigError> {
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.deprecated_host_port.is_empty() {
            return Err(ConfigError::EmptyMarker("deprecated_host_port"));
        }
        if self.current_host_port.is_empty() {
            return Err(ConfigError::EmptyMarker("current_host_port"));
        }
        if self.deprecated_host_port == self.current_host_port {
            tracing::warn!(
                marker = %self.current_host_port,
                "deprecated and current markers are identical; nothing can be CORRECT"
            );
        }
        Ok(())
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(&self.deprecated_host_port, &self.current_host_port)
    }

    pub fn fields(&self) -> FieldNames {
        FieldNames {
            image: self.image_field.clone(),
            title: self.title_field.clone(),
        }
    }
}
