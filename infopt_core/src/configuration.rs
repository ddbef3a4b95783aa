//! Process wide configuration, used for defaults when building models and solvers
use std::fs;
use std::path::Path;
use std::sync::{LazyLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimize::solvers::SolverKind;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Configuration values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Supports of a parameter closer together than this are treated as the same support
    pub support_tolerance: f64,
    /// Number of supports generated for a parameter when none are given explicitly
    pub num_supports: usize,
    /// Solver used when no optimizer is given explicitly
    pub solver: SolverKind,
    /// Feasibility and gap tolerance passed to the solver
    pub tolerance: f64,
    /// Maximum number of solver iterations
    pub max_iterations: u32,
    /// Solver time limit in seconds, None for no limit
    pub time_limit: Option<f64>,
    /// Should the solver print its progress
    pub verbose: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            support_tolerance: 1e-8,
            num_supports: 10,
            solver: SolverKind::Clarabel,
            tolerance: 1e-8,
            max_iterations: 200,
            time_limit: None,
            verbose: false,
        }
    }
}

impl Configuration {
    /// Read a configuration from a JSON string, missing fields take their default values
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let json_data = fs::read_to_string(path)?;
        Self::from_json_str(&json_data)
    }
}

/// Get a copy of the current configuration
pub fn current() -> Configuration {
    CONFIGURATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the current configuration
pub fn set(configuration: Configuration) {
    *CONFIGURATION
        .write()
        .unwrap_or_else(PoisonError::into_inner) = configuration;
}

/// Errors when loading a configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration file couldn't be read
    #[error("Unable to read configuration file")]
    FileNotFound(#[from] std::io::Error),
    /// The configuration wasn't valid JSON, or had fields of the wrong type
    #[error("Unable to deserialize configuration")]
    DeserializeError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = Configuration::from_json_str(r#"{"num_supports": 4, "verbose": true}"#).unwrap();
        assert_eq!(config.num_supports, 4);
        assert!(config.verbose);
        assert_eq!(config.solver, SolverKind::Clarabel);
        assert_eq!(config.time_limit, None);
        assert_eq!(config.max_iterations, Configuration::default().max_iterations);
    }

    #[test]
    fn solver_kind_from_json() {
        let config = Configuration::from_json_str(r#"{"solver": "highs", "time_limit": 2.5}"#).unwrap();
        assert_eq!(config.solver, SolverKind::Highs);
        assert_eq!(config.time_limit, Some(2.5));
    }

    #[test]
    fn bad_json() {
        match Configuration::from_json_str(r#"{"num_supports": "many"}"#) {
            Err(ConfigurationError::DeserializeError(_)) => {}
            _ => panic!("Invalid configuration not caught"),
        }
        match Configuration::from_json_file("this/file/does/not/exist.json") {
            Err(ConfigurationError::FileNotFound(_)) => {}
            _ => panic!("Missing file not caught"),
        }
    }
}
