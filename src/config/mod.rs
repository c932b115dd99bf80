//! Layered configuration: embedded defaults, an optional override file, then
//! `SECURE_LETTERS__*` environment variables.

#![allow(clippy::result_large_err)]

pub mod model;
pub mod validation;

pub use model::{
    Config, DatabaseConfig, EmailConfig, FieldsConfig, NoticesConfig, PdfConfig, PipelineConfig,
    QueueSpec, RendererConfig,
};
pub use validation::{ValidationError, ValidationErrors};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use thiserror::Error;

use crate::models::CustomerDefaults;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");
const ENV_PREFIX: &str = "SECURE_LETTERS__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl Config {
    /// Load and validate, applying `path` over the defaults when it exists.
    ///
    /// A missing override file is not an error; the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults merged with an in-memory TOML document, no environment.
    pub fn from_toml_str(overrides: &str) -> Result<Self, ConfigError> {
        let config: Config = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::string(overrides))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate(self)
    }

    pub fn customer_defaults(&self) -> CustomerDefaults {
        CustomerDefaults {
            product: self.email.bad_product_default.clone(),
            email: self.email.bad_email_default.clone(),
        }
    }
}

fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));
    if let Some(path) = path {
        if path.exists() {
            log::info!("Parsing {}", path.display());
            figment = figment.merge(Toml::file(path));
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
        }
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
    if let Ok(url) = std::env::var("DATABASE_URL") {
        figment = figment.merge(("database.url", url));
    }
    figment
}
