//! Designer configuration.
//!
//! Loaded via the `config` crate from an optional file, then overridden by
//! `PLANTOPS__*` environment variables, e.g.
//! `PLANTOPS__VALIDATOR__MAX_CONDITION_BRANCHES=8`.

use plantops_workflow::ValidatorConfig;
use serde::Deserialize;
use std::path::Path;

/// Configuration for the designer front end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignerConfig {
    /// Thresholds for the pre-save validator.
    #[serde(default)]
    pub validator: ValidatorConfig,
}

impl DesignerConfig {
    /// Loads configuration from `path` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, or a value
    /// has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("PLANTOPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
