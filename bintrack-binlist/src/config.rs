//! Engine configuration, read from TOML.
//!
//! ```toml
//! threads = 8
//! accelerator_factor = 100
//! accelerator_max_bin_width = 1000000
//! precision = "single"
//! method = "average"
//! ```
//!
//! Every key is optional. `BINTRACK_NUM_THREADS` overrides `threads`.

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use bintrack_core::{AggregationMethod, Precision};

use crate::consts::{ACCELERATOR_FACTOR, ACCELERATOR_MAX_BINWIDTH, NUM_THREADS_ENV};
use crate::errors::BinListError;
use crate::executor::{ExecutionCoordinator, default_worker_count};
use crate::pyramid::PyramidSettings;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Worker threads in the shared pool; hardware concurrency when unset.
    pub threads: Option<usize>,
    pub accelerator_factor: u32,
    pub accelerator_max_bin_width: u32,
    pub precision: Precision,
    pub method: AggregationMethod,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            threads: None,
            accelerator_factor: ACCELERATOR_FACTOR,
            accelerator_max_bin_width: ACCELERATOR_MAX_BINWIDTH,
            precision: Precision::default(),
            method: AggregationMethod::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, BinListError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read a TOML config file, then apply the environment override.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BinListError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(BinListError::ConfigRead)?;
        debug!("Loaded engine config from {}", path.display());
        Self::from_toml_str(&contents)?.with_env()
    }

    /// Apply `BINTRACK_NUM_THREADS` when it is set.
    pub fn with_env(self) -> Result<Self, BinListError> {
        let value = std::env::var(NUM_THREADS_ENV).ok();
        self.with_thread_override(value.as_deref())
    }

    pub fn with_thread_override(mut self, value: Option<&str>) -> Result<Self, BinListError> {
        if let Some(value) = value {
            let threads = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| BinListError::InvalidConfigValue {
                    name: NUM_THREADS_ENV.to_string(),
                    value: value.to_string(),
                })?;
            self.threads = Some(threads);
        }
        Ok(self)
    }

    pub fn worker_count(&self) -> usize {
        match self.threads {
            Some(n) if n > 0 => n,
            _ => default_worker_count(),
        }
    }

    pub fn pyramid_settings(&self) -> Result<PyramidSettings, BinListError> {
        PyramidSettings::new(self.accelerator_factor, self.accelerator_max_bin_width)
    }

    /// Start the shared pool sized by this config.
    pub fn coordinator(&self) -> Result<ExecutionCoordinator, BinListError> {
        Ok(ExecutionCoordinator::new(self.worker_count())?)
    }
}
