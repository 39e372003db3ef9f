//! Transform method selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RegimeConfig;

use super::calibration::CalibrationConfig;

/// Method requested through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeMethod {
    Auto,
    Absolute,
    ZScore,
    Percentile,
    Calibrated,
}

impl RegimeMethod {
    /// Case-insensitive parse of a configured method name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "absolute" => Some(Self::Absolute),
            "zscore" => Some(Self::ZScore),
            "percentile" => Some(Self::Percentile),
            "calibrated" => Some(Self::Calibrated),
            _ => None,
        }
    }
}

/// Kind of comparable value a transform produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Raw windowed mean.
    Absolute,
    /// Windowed mean standardized against the lookback.
    ZScore,
    /// Percentile rank of the windowed mean within the lookback.
    Percentile,
}

impl ValueKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "absolute" => Some(Self::Absolute),
            "zscore" => Some(Self::ZScore),
            "percentile" => Some(Self::Percentile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::ZScore => "zscore",
            Self::Percentile => "percentile",
        }
    }

    /// History length below which this kind is statistically weak.
    pub fn min_samples(&self, config: &RegimeConfig) -> Option<usize> {
        match self {
            Self::Absolute => None,
            Self::ZScore => Some(config.auto_z_min_samples),
            Self::Percentile => Some(config.auto_pct_min_samples),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method chosen for one computation.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedMethod {
    Absolute,
    ZScore,
    Percentile,
    /// Calibration artifact dictates both transform and thresholds.
    Calibrated(CalibrationConfig),
}

impl SelectedMethod {
    /// Transform that will run for this method.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Absolute => ValueKind::Absolute,
            Self::ZScore => ValueKind::ZScore,
            Self::Percentile => ValueKind::Percentile,
            Self::Calibrated(calibration) => calibration.value_type,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, Self::Calibrated(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Calibrated(_) => "calibrated",
            other => other.value_kind().as_str(),
        }
    }
}

/// Pick the transform for a history of `sample_count` scores.
///
/// An explicit request wins. `Calibrated` without a loaded artifact runs as
/// `Absolute`. Under `Auto` a present artifact wins, otherwise the method
/// escalates with history length.
pub fn select_method(
    sample_count: usize,
    requested: RegimeMethod,
    calibration: Option<&CalibrationConfig>,
    config: &RegimeConfig,
) -> SelectedMethod {
    match requested {
        RegimeMethod::Absolute => SelectedMethod::Absolute,
        RegimeMethod::ZScore => SelectedMethod::ZScore,
        RegimeMethod::Percentile => SelectedMethod::Percentile,
        RegimeMethod::Calibrated => match calibration {
            Some(c) => SelectedMethod::Calibrated(c.clone()),
            None => SelectedMethod::Absolute,
        },
        RegimeMethod::Auto => {
            if let Some(c) = calibration {
                SelectedMethod::Calibrated(c.clone())
            } else if sample_count >= config.auto_pct_min_samples {
                SelectedMethod::Percentile
            } else if sample_count >= config.auto_z_min_samples {
                SelectedMethod::ZScore
            } else {
                SelectedMethod::Absolute
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::ThresholdSet;

    fn calibration() -> CalibrationConfig {
        CalibrationConfig {
            value_type: ValueKind::ZScore,
            thresholds: ThresholdSet::normalized(0.5, Some(0.1), 1.5, Some(1.0)),
        }
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(RegimeMethod::parse("AUTO"), Some(RegimeMethod::Auto));
        assert_eq!(RegimeMethod::parse("percentile"), Some(RegimeMethod::Percentile));
        assert_eq!(RegimeMethod::parse("Calibrated"), Some(RegimeMethod::Calibrated));
        assert_eq!(RegimeMethod::parse("z-score"), None);
        assert_eq!(ValueKind::parse("zscore"), Some(ValueKind::ZScore));
        assert_eq!(ValueKind::parse("calibrated"), None);
    }

    #[test]
    fn test_auto_escalates_with_history_length() {
        let config = RegimeConfig::default();
        assert_eq!(select_method(200, RegimeMethod::Auto, None, &config), SelectedMethod::Percentile);
        assert_eq!(select_method(180, RegimeMethod::Auto, None, &config), SelectedMethod::Percentile);
        assert_eq!(select_method(100, RegimeMethod::Auto, None, &config), SelectedMethod::ZScore);
        assert_eq!(select_method(90, RegimeMethod::Auto, None, &config), SelectedMethod::ZScore);
        assert_eq!(select_method(89, RegimeMethod::Auto, None, &config), SelectedMethod::Absolute);
        assert_eq!(select_method(10, RegimeMethod::Auto, None, &config), SelectedMethod::Absolute);
    }

    #[test]
    fn test_explicit_method_wins() {
        let config = RegimeConfig::default();
        let cal = calibration();
        assert_eq!(select_method(5, RegimeMethod::Percentile, Some(&cal), &config), SelectedMethod::Percentile);
        assert_eq!(select_method(500, RegimeMethod::Absolute, None, &config), SelectedMethod::Absolute);
    }

    #[test]
    fn test_calibration_wins_under_auto() {
        let config = RegimeConfig::default();
        let cal = calibration();
        for n in [1, 100, 1000] {
            let selected = select_method(n, RegimeMethod::Auto, Some(&cal), &config);
            assert!(selected.is_calibrated());
            assert_eq!(selected.name(), "calibrated");
            assert_eq!(selected.value_kind(), ValueKind::ZScore);
        }
    }

    #[test]
    fn test_calibrated_request_without_artifact_runs_absolute() {
        let config = RegimeConfig::default();
        assert_eq!(select_method(300, RegimeMethod::Calibrated, None, &config), SelectedMethod::Absolute);
    }
}
