//! Runtime configuration.
//!
//! Defaults match the directory convention the tool was built for. Each can
//! be overridden from the environment (or a `.env` file):
//!
//! | Variable             | Default                 |
//! |----------------------|-------------------------|
//! | `MOJI_SOURCE_COLUMN` | `変換元`                |
//! | `MOJI_TARGET_COLUMN` | `変換先`                |
//! | `MOJI_OUTPUT_SUFFIX` | `_translate`            |
//! | `MOJI_ASSET_PREFIX`  | `../files/`             |
//! | `MOJI_TITLE_MARKER`  | `l-page__header-title`  |
//! | `MOJI_CONCURRENCY`   | `4`                     |

use std::env;

use crate::error::ConfigError;
use crate::parser::{MappingColumns, DEFAULT_SOURCE_COLUMN, DEFAULT_TARGET_COLUMN};
use crate::transform::assets::DEFAULT_ASSET_PREFIX;

/// Suffix appended to the file stem of translated documents.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_translate";

/// Class marker of the element holding a page's display title.
pub const DEFAULT_TITLE_MARKER: &str = "l-page__header-title";

/// Extension of the documents picked up by the batch driver.
pub const DEFAULT_EXTENSION: &str = "html";

/// Documents processed at once by the batch driver.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub columns: MappingColumns,
    pub output_suffix: String,
    pub asset_prefix: String,
    pub title_marker: String,
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: MappingColumns::new(DEFAULT_SOURCE_COLUMN, DEFAULT_TARGET_COLUMN),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            title_marker: DEFAULT_TITLE_MARKER.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(v) = non_empty(&lookup, "MOJI_SOURCE_COLUMN") {
            config.columns.source = v;
        }
        if let Some(v) = non_empty(&lookup, "MOJI_TARGET_COLUMN") {
            config.columns.target = v;
        }
        // An empty suffix is allowed: outputs then keep their input names.
        if let Some(v) = lookup("MOJI_OUTPUT_SUFFIX") {
            config.output_suffix = v;
        }
        if let Some(v) = non_empty(&lookup, "MOJI_ASSET_PREFIX") {
            config.asset_prefix = v;
        }
        if let Some(v) = non_empty(&lookup, "MOJI_TITLE_MARKER") {
            config.title_marker = v;
        }
        if let Some(v) = non_empty(&lookup, "MOJI_CONCURRENCY") {
            config.concurrency = parse_concurrency("MOJI_CONCURRENCY", &v)?;
        }

        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a positive worker count.
pub fn parse_concurrency(key: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a positive integer, got '{}'", value),
        }),
    }
}
