//! Run configuration.
//!
//! Values are read once from environment-style key/value pairs and passed
//! explicitly into [`crate::engine::run_etl`].

use crate::error::{EtlError, Result};
use chrono::NaiveDate;
use log::LevelFilter;
use std::env;
use std::path::PathBuf;

pub const PROCESS_ALL: &str = "PROCESS_ALL";
pub const LOGS_LEVEL: &str = "LOGS_LEVEL";
pub const INPUT_DATA_PATH: &str = "INPUT_DATA_PATH";
pub const OUTPUT_DATA_PATH: &str = "OUTPUT_DATA_PATH";
pub const RUN_DATE: &str = "RUN_DATE";

pub const DEFAULT_LOGS_LEVEL: LevelFilter = LevelFilter::Info;
pub const DEFAULT_INPUT_DIR: &str = "../data/input";
pub const DEFAULT_OUTPUT_DIR: &str = "../data/output";

/// How watermarks are derived for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Rebuild outputs from each stream's earliest record.
    Full,

    /// Resume from the latest date already present in the prior outputs.
    Incremental,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub mode: RunMode,
    pub logs_level: LevelFilter,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,

    /// Overrides the local calendar date used as "today".
    pub run_date: Option<NaiveDate>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            mode: RunMode::Incremental,
            logs_level: DEFAULT_LOGS_LEVEL,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            run_date: None,
        }
    }
}

impl EtlConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = EtlConfig::default();

        if let Some(value) = get(PROCESS_ALL) {
            let flag: i64 = value.parse().map_err(|_| EtlError::InvalidConfig {
                key: PROCESS_ALL,
                value: value.clone(),
                message: "expected an integer such as 0 or 1".to_string(),
            })?;
            config.mode = if flag != 0 {
                RunMode::Full
            } else {
                RunMode::Incremental
            };
        }

        if let Some(value) = get(LOGS_LEVEL) {
            config.logs_level = parse_log_level(&value).ok_or_else(|| EtlError::InvalidConfig {
                key: LOGS_LEVEL,
                value: value.clone(),
                message: "expected one of CRITICAL, ERROR, WARNING, INFO, DEBUG, TRACE, NOTSET"
                    .to_string(),
            })?;
        }
        if let Some(value) = get(INPUT_DATA_PATH) {
            config.input_dir = PathBuf::from(value);
        }
        if let Some(value) = get(OUTPUT_DATA_PATH) {
            config.output_dir = PathBuf::from(value);
        }

        if let Some(value) = get(RUN_DATE) {
            let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
                EtlError::InvalidConfig {
                    key: RUN_DATE,
                    value: value.clone(),
                    message: e.to_string(),
                }
            })?;
            config.run_date = Some(date);
        }

        Ok(config)
    }

    pub fn process_all(&self) -> bool {
        self.mode == RunMode::Full
    }
}

/// Maps a `logging`-style level name onto a `log` filter, ignoring case.
///
/// `CRITICAL`/`FATAL` fold into `error`; `NOTSET` lets everything through.
pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" | "FATAL" | "ERROR" => Some(LevelFilter::Error),
        "WARNING" | "WARN" => Some(LevelFilter::Warn),
        "INFO" => Some(LevelFilter::Info),
        "DEBUG" => Some(LevelFilter::Debug),
        "TRACE" | "NOTSET" => Some(LevelFilter::Trace),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}
