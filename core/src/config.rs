use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file")]
    Io(#[from] io::Error),
    #[error("Unable to parse config")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tuning knobs of a solving session.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// How many nearest entities count as adjacent.
    pub neighbor_count: usize,
    /// Half-width of the band accepted around a new best distance reading.
    pub tolerance_miles: f64,
    /// Decay constant of the closeness score.
    pub lambda_km: f64,
    /// How many suggestions to show per turn.
    pub top: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            neighbor_count: 6,
            tolerance_miles: 400.,
            lambda_km: 5000.,
            top: 5,
        }
    }
}

impl SolverConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.neighbor_count == 0 {
            return Err(ConfigError::Invalid(
                "neighbor_count must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance_miles.is_finite() && self.tolerance_miles >= 0.) {
            return Err(ConfigError::Invalid(format!(
                "tolerance_miles must be a non-negative number. Found {}",
                self.tolerance_miles
            )));
        }
        if !(self.lambda_km.is_finite() && self.lambda_km > 0.) {
            return Err(ConfigError::Invalid(format!(
                "lambda_km must be positive. Found {}",
                self.lambda_km
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn missing_fields_take_defaults() {
        let config = SolverConfig::from_json(r#"{"tolerance_miles": 250}"#).unwrap();
        assert_eq!(
            SolverConfig {
                tolerance_miles: 250.,
                ..SolverConfig::default()
            },
            config
        );
    }

    #[test]
    fn default_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
        assert!(SolverConfig::from_json("{}").is_ok());
    }

    #[rstest]
    #[case(r#"{"neighbor_count": 0}"#)]
    #[case(r#"{"tolerance_miles": -1}"#)]
    #[case(r#"{"lambda_km": 0}"#)]
    fn rejects_out_of_range(#[case] json: &str) {
        assert!(matches!(
            SolverConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            SolverConfig::from_json(r#"{"lambda_km": "far"}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
