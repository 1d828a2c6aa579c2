//! Configuration loading and validation

mod schema;

pub use schema::*;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Configuration failures, reported at load or hot-replace time.
///
/// A failed load or replacement leaves any previously active
/// configuration untouched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration")]
    Parse(#[from] serde_yaml::Error),

    #[error("rule {index} for '{signal}' has an empty affect path")]
    EmptyAffect { signal: String, index: usize },

    #[error("rule {index} for '{signal}' rescales over an empty input range")]
    EmptyInputRange { signal: String, index: usize },

    #[error("unknown input category '{0}'")]
    UnknownCategory(String),

    #[error("unknown signal '{signal}' in category '{category}'")]
    UnknownSignal { category: String, signal: String },

    #[error("'{signal}' should be {expected}")]
    ShapeMismatch {
        signal: String,
        expected: &'static str,
    },
}

/// Load configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<InstrumentConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

/// Parse and validate configuration text.
pub fn parse_config(text: &str) -> Result<InstrumentConfig, ConfigError> {
    let config: InstrumentConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}
