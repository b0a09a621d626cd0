//! Stabilization run configuration.
//!
//! Loaded from a TOML file with one table per pipeline concern. Every table
//! has defaults matching the reference behaviour (stride 3, half-window 5,
//! linear interpolation, zero background), so an empty file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::warp::Interpolation;

/// Registration sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Register every `rate`-th frame.
    pub rate: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { rate: 3 }
    }
}

/// Median smoothing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Half-window radius; the window spans `2 * width + 1` frames.
    pub width: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { width: 5 }
    }
}

/// Sub-range of the input stack to process (`[start_frame, end_frame)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// First frame to process (default 0).
    pub start_frame: Option<usize>,
    /// One past the last frame to process (default: stack length).
    pub end_frame: Option<usize>,
}

/// Resampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Sampling kernel.
    pub interpolation: Interpolation,
    /// Value written where a transformed frame has no data.
    pub background: f32,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Linear,
            background: 0.0,
        }
    }
}

/// Settings for the built-in moment registrar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Estimate rotation in addition to translation.
    pub estimate_rotation: bool,
    /// Minimum summed intensity for a frame to be registrable.
    pub min_mass: f64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            estimate_rotation: true,
            min_mass: 1e-6,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// `[sampling]` table.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// `[smoothing]` table.
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    /// `[range]` table.
    #[serde(default)]
    pub range: RangeConfig,
    /// `[resample]` table.
    #[serde(default)]
    pub resample: ResampleConfig,
    /// `[registration]` table.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("sampling rate must be at least 1")]
    InvalidSamplingRate,
    #[error("invalid frame range: start {start} is not before end {end}")]
    InvalidRange { start: usize, end: usize },
    #[error("background value must be finite")]
    InvalidBackground,
    #[error("minimum registration mass must be finite and non-negative")]
    InvalidMinMass,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

impl StabilizerConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.rate == 0 {
            return Err(ConfigError::InvalidSamplingRate);
        }
        if let (Some(start), Some(end)) = (self.range.start_frame, self.range.end_frame) {
            if start >= end {
                return Err(ConfigError::InvalidRange { start, end });
            }
        }
        if !self.resample.background.is_finite() {
            return Err(ConfigError::InvalidBackground);
        }
        if !self.registration.min_mass.is_finite() || self.registration.min_mass < 0.0 {
            return Err(ConfigError::InvalidMinMass);
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StabilizerConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml_str(&content)
    }
}
