
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cleaner::ParsePolicy;
use crate::models::{ColumnNames, TableFormat, DEFAULT_TIMESTAMP_FORMATS};

pub const DEFAULT_CONFIG_PATH: &str = "fraud-explorer.toml";
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file [{path}]: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Delimiter [{0}] must be a single ASCII character")]
    InvalidDelimiter(char),
    #[error("Histogram bins [{0}] must be between 1 and {max}", max = MAX_HISTOGRAM_BINS)]
    InvalidHistogramBins(usize)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub raw_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub delimiter: char,
    pub on_parse_error: ParsePolicy,
    pub histogram_bins: usize,
    pub timestamp_formats: Vec<String>,
    pub columns: ColumnNames
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/raw/transactions.csv"),
            cleaned_path: PathBuf::from("data/cleansed/transactions_clean.csv"),
            delimiter: ',',
            on_parse_error: ParsePolicy::default(),
            histogram_bins: 50,
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS.iter().map(|format| format.to_string()).collect(),
            columns: ColumnNames::default()
        }
    }
}

impl Config {
    /// Loads the config file at `path`, or the default location when no path is given.
    ///
    /// Only an explicitly requested file has to exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false)
        };

        match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded config from {}", path.display());
                Self::parse(&content)
            }
            Err(error) if error.kind() == ErrorKind::NotFound && !required => {
                debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source
            })
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;

        if !(1..=MAX_HISTOGRAM_BINS).contains(&config.histogram_bins) {
            return Err(ConfigError::InvalidHistogramBins(config.histogram_bins));
        }

        config.table_format()?;
        Ok(config)
    }

    pub fn table_format(&self) -> Result<TableFormat, ConfigError> {
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::InvalidDelimiter(self.delimiter));
        }

        Ok(TableFormat {
            columns: self.columns.clone(),
            timestamp_formats: self.timestamp_formats.clone(),
            delimiter: self.delimiter as u8
        })
    }
}
