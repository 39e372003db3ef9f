//! Threshold sets and their resolution from configuration.

use serde::{Deserialize, Serialize};

use crate::config::{PhaseThresholdConfig, RegimeConfig, ThresholdPair};

use super::method::ValueKind;

/// Enter/exit thresholds for phases 2 and 3.
///
/// Always holds `phase2_enter >= phase2_exit` and `phase3_enter >= phase3_exit`
/// when built through [`ThresholdSet::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub phase2_enter: f64,
    pub phase2_exit: f64,
    pub phase3_enter: f64,
    pub phase3_exit: f64,
}

impl ThresholdSet {
    /// Build a set, collapsing any exit that sits above its enter.
    pub fn normalized(
        phase2_enter: f64,
        phase2_exit: Option<f64>,
        phase3_enter: f64,
        phase3_exit: Option<f64>,
    ) -> Self {
        let (phase2_enter, phase2_exit) = normalize_pair(phase2_enter, phase2_exit);
        let (phase3_enter, phase3_exit) = normalize_pair(phase3_enter, phase3_exit);
        Self {
            phase2_enter,
            phase2_exit,
            phase3_enter,
            phase3_exit,
        }
    }

    fn from_config(config: &PhaseThresholdConfig) -> Self {
        let ThresholdPair { enter: p2, exit: p2x } = config.phase2;
        let ThresholdPair { enter: p3, exit: p3x } = config.phase3;
        Self::normalized(p2, Some(p2x), p3, Some(p3x))
    }
}

/// Normalize an enter/exit pair so the exit is never looser than the enter.
pub fn normalize_pair(enter: f64, exit: Option<f64>) -> (f64, f64) {
    match exit {
        Some(exit) if exit <= enter => (enter, exit),
        _ => (enter, enter),
    }
}

/// Resolved threshold sets, one per transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodThresholds {
    pub absolute: ThresholdSet,
    pub zscore: ThresholdSet,
    pub percentile: ThresholdSet,
}

impl MethodThresholds {
    /// Resolve all three sets from configuration.
    pub fn resolve(config: &RegimeConfig) -> Self {
        Self {
            absolute: ThresholdSet::from_config(&config.absolute),
            zscore: ThresholdSet::from_config(&config.zscore),
            percentile: ThresholdSet::from_config(&config.percentile),
        }
    }

    /// Threshold set compared against values of the given kind.
    pub fn for_kind(&self, kind: ValueKind) -> &ThresholdSet {
        match kind {
            ValueKind::Absolute => &self.absolute,
            ValueKind::ZScore => &self.zscore,
            ValueKind::Percentile => &self.percentile,
        }
    }
}
