//! Externally calibrated threshold override.
//!
//! The artifact is a flat JSON object:
//!
//! ```json
//! {"value_type": "percentile", "phase2_enter": 65, "phase2_exit": 55,
//!  "phase3_enter": 90, "phase3_exit": 75}
//! ```
//!
//! Anything unreadable or incomplete is treated as if no artifact existed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::method::ValueKind;
use super::thresholds::ThresholdSet;

/// Reasons an artifact was rejected.
#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Top-level value is not an object")]
    NotAnObject,

    #[error("Unrecognized value_type: {0}")]
    UnknownValueType(String),

    #[error("Missing or non-numeric field: {0}")]
    MissingField(&'static str),
}

/// Calibrated transform and its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub value_type: ValueKind,
    pub thresholds: ThresholdSet,
}

impl CalibrationConfig {
    /// Load an artifact, returning `None` when it is absent or invalid.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::read(path) {
            Ok(calibration) => {
                debug!(path = %path.display(), value_type = %calibration.value_type, "loaded calibration");
                Some(calibration)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring calibration artifact");
                None
            }
        }
    }

    fn read(path: &Path) -> Result<Self, CalibrationError> {
        let content = std::fs::read_to_string(path)?;
        let payload: Value = serde_json::from_str(&content)?;
        Self::from_value(&payload)
    }

    /// Validate a parsed artifact.
    pub fn from_value(payload: &Value) -> Result<Self, CalibrationError> {
        let object = payload.as_object().ok_or(CalibrationError::NotAnObject)?;

        let value_type = match object.get("value_type") {
            Some(Value::String(s)) => {
                ValueKind::parse(s).ok_or_else(|| CalibrationError::UnknownValueType(s.clone()))?
            }
            Some(other) => return Err(CalibrationError::UnknownValueType(other.to_string())),
            None => return Err(CalibrationError::UnknownValueType("<missing>".into())),
        };

        let phase2_enter = number(object, "phase2_enter")?;
        let phase2_exit = number(object, "phase2_exit")?;
        let phase3_enter = number(object, "phase3_enter")?;
        let phase3_exit = number(object, "phase3_exit")?;

        Ok(Self {
            value_type,
            thresholds: ThresholdSet::normalized(
                phase2_enter,
                Some(phase2_exit),
                phase3_enter,
                Some(phase3_exit),
            ),
        })
    }
}

/// Numbers and numeric strings are accepted; null counts as missing.
fn number(object: &Map<String, Value>, field: &'static str) -> Result<f64, CalibrationError> {
    match object.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or(CalibrationError::MissingField(field)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CalibrationError::MissingField(field)),
        _ => Err(CalibrationError::MissingField(field)),
    }
}
