//! Engine settings
//!
//! Tunables that control query execution, independent of the dataset:
//! - Worker pool size for non-blocking execution
//! - Maximum snapping distance (coverage cutoff)
//! - Alternative route acceptance thresholds

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on `max_snap_distance_m`
pub const MAX_SNAP_DISTANCE_M: f64 = 100_000.0;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors that can occur during settings validation
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingsError {
    #[error("worker_threads must be at least 1, got {0}")]
    InvalidWorkerThreads(usize),

    #[error("max_snap_distance_m must be within (0, 100000], got {0}")]
    InvalidSnapDistance(f64),

    #[error("alternative.max_cost_ratio must be >= 1.0, got {0}")]
    InvalidCostRatio(f64),

    #[error("alternative.max_shared_ratio must be within (0, 1], got {0}")]
    InvalidSharedRatio(f64),

    #[error("alternative.penalty_factor must be > 1.0, got {0}")]
    InvalidPenaltyFactor(f64),

    #[error("settings are not valid JSON: {0}")]
    Parse(String),
}

impl From<SettingsError> for crate::Error {
    fn from(err: SettingsError) -> Self {
        crate::Error::InvalidSettings(err.to_string())
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Thresholds for accepting an alternative route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativeSettings {
    /// Alternative cost may be at most this multiple of the primary cost
    pub max_cost_ratio: f64,
    /// Fraction of the alternative's length that may overlap the primary
    pub max_shared_ratio: f64,
    /// Weight multiplier applied to primary route edges when searching
    pub penalty_factor: f64,
}

impl Default for AlternativeSettings {
    fn default() -> Self {
        Self {
            max_cost_ratio: 1.25,
            max_shared_ratio: 0.75,
            penalty_factor: 2.0,
        }
    }
}

/// Engine execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Threads servicing non-blocking `run` calls
    pub worker_threads: usize,

    /// Coordinates farther than this from any road are out of coverage
    pub max_snap_distance_m: f64,

    pub alternative: AlternativeSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let worker_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            worker_threads,
            max_snap_distance_m: 1000.0,
            alternative: AlternativeSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Parse settings from a JSON document; absent fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: EngineSettings =
            serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.worker_threads == 0 {
            return Err(SettingsError::InvalidWorkerThreads(self.worker_threads));
        }

        if !(self.max_snap_distance_m > 0.0 && self.max_snap_distance_m <= MAX_SNAP_DISTANCE_M) {
            return Err(SettingsError::InvalidSnapDistance(self.max_snap_distance_m));
        }

        let alt = &self.alternative;
        if alt.max_cost_ratio.is_nan() || alt.max_cost_ratio < 1.0 {
            return Err(SettingsError::InvalidCostRatio(alt.max_cost_ratio));
        }
        if alt.max_shared_ratio.is_nan() || alt.max_shared_ratio <= 0.0 || alt.max_shared_ratio > 1.0 {
            return Err(SettingsError::InvalidSharedRatio(alt.max_shared_ratio));
        }
        if alt.penalty_factor.is_nan() || alt.penalty_factor <= 1.0 {
            return Err(SettingsError::InvalidPenaltyFactor(alt.penalty_factor));
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
