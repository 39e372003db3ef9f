//! Engine configuration.
//!
//! Every recognized key is listed here with its default. The engine never
//! reads the environment itself; callers build a [`RegimeConfig`] once and
//! pass it in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::regime::RegimeMethod;

/// Raw enter/exit pair as configured, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub enter: f64,
    pub exit: f64,
}

impl ThresholdPair {
    pub const fn new(enter: f64, exit: f64) -> Self {
        Self { enter, exit }
    }
}

/// Configured thresholds for one transform method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseThresholdConfig {
    pub phase2: ThresholdPair,
    pub phase3: ThresholdPair,
}

/// Regime engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Requested transform method (`REGIME_METHOD`).
    pub method: RegimeMethod,
    /// Thresholds compared against the raw windowed mean.
    pub absolute: PhaseThresholdConfig,
    /// Thresholds compared against the z-score of the windowed mean.
    pub zscore: PhaseThresholdConfig,
    /// Thresholds compared against the percentile rank (0-100).
    pub percentile: PhaseThresholdConfig,
    /// Lookback for the z-score mean/std. Zero uses every score.
    pub z_lookback: usize,
    /// Lookback for the percentile rank. Zero uses every score.
    pub pct_lookback: usize,
    /// Minimum history length before auto selects z-score.
    pub auto_z_min_samples: usize,
    /// Minimum history length before auto selects percentile.
    pub auto_pct_min_samples: usize,
    /// Optional calibration artifact.
    pub calibration_path: Option<PathBuf>,
    /// Default windowed-mean length (days).
    pub window_days: usize,
    /// Default trend sub-window length (days).
    pub trend_days: usize,
    /// Minimum scores in the window for high confidence.
    pub min_days: usize,
    /// History store file.
    pub history_path: PathBuf,
    /// Rows older than this many days are pruned. Zero keeps everything.
    pub retention_days: i64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            method: RegimeMethod::Auto,
            absolute: PhaseThresholdConfig {
                phase2: ThresholdPair::new(2.0, 1.5),
                phase3: ThresholdPair::new(4.0, 3.0),
            },
            zscore: PhaseThresholdConfig {
                phase2: ThresholdPair::new(0.25, 0.0),
                phase3: ThresholdPair::new(1.0, 0.6),
            },
            percentile: PhaseThresholdConfig {
                phase2: ThresholdPair::new(60.0, 50.0),
                phase3: ThresholdPair::new(85.0, 70.0),
            },
            z_lookback: 180,
            pct_lookback: 180,
            auto_z_min_samples: 90,
            auto_pct_min_samples: 180,
            calibration_path: Some(PathBuf::from("output/regime_calibration.json")),
            window_days: 7,
            trend_days: 3,
            min_days: 5,
            history_path: PathBuf::from("output/history.json"),
            retention_days: 0,
        }
    }
}

impl RegimeConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or malformed values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let reader = Reader { lookup: &lookup };

        let method = match lookup("REGIME_METHOD") {
            Some(raw) => RegimeMethod::parse(&raw).unwrap_or_else(|| {
                debug!(value = %raw, "unrecognized REGIME_METHOD, using auto");
                RegimeMethod::Auto
            }),
            None => d.method,
        };

        Self {
            method,
            absolute: PhaseThresholdConfig {
                phase2: reader.pair("PHASE_2_THRESHOLD", "PHASE_2_EXIT_THRESHOLD", d.absolute.phase2),
                phase3: reader.pair("PHASE_3_THRESHOLD", "PHASE_3_EXIT_THRESHOLD", d.absolute.phase3),
            },
            zscore: PhaseThresholdConfig {
                phase2: reader.pair("REGIME_Z_PHASE2_ENTER", "REGIME_Z_PHASE2_EXIT", d.zscore.phase2),
                phase3: reader.pair("REGIME_Z_PHASE3_ENTER", "REGIME_Z_PHASE3_EXIT", d.zscore.phase3),
            },
            percentile: PhaseThresholdConfig {
                phase2: reader.pair("REGIME_PCT_PHASE2_ENTER", "REGIME_PCT_PHASE2_EXIT", d.percentile.phase2),
                phase3: reader.pair("REGIME_PCT_PHASE3_ENTER", "REGIME_PCT_PHASE3_EXIT", d.percentile.phase3),
            },
            z_lookback: reader.span("REGIME_Z_LOOKBACK", d.z_lookback),
            pct_lookback: reader.span("REGIME_PCT_LOOKBACK", d.pct_lookback),
            auto_z_min_samples: reader.span("REGIME_AUTO_Z_MIN_SAMPLES", d.auto_z_min_samples),
            auto_pct_min_samples: reader.span("REGIME_AUTO_PCT_MIN_SAMPLES", d.auto_pct_min_samples),
            calibration_path: match lookup("REGIME_CALIBRATION_PATH") {
                Some(raw) if raw.trim().is_empty() => None,
                Some(raw) => Some(PathBuf::from(raw.trim())),
                None => d.calibration_path,
            },
            window_days: reader.span("REGIME_WINDOW_DAYS", d.window_days),
            trend_days: reader.span("REGIME_TREND_DAYS", d.trend_days),
            min_days: reader.span("REGIME_MIN_DAYS", d.min_days),
            history_path: lookup("HISTORY_DB_PATH")
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| PathBuf::from(raw.trim()))
                .unwrap_or(d.history_path),
            retention_days: reader.int("HISTORY_RETENTION_DAYS", d.retention_days),
        }
    }
}

struct Reader<'a, F> {
    lookup: &'a F,
}

impl<F> Reader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn float(&self, key: &str, default: f64) -> f64 {
        match (self.lookup)(key) {
            Some(raw) => raw.trim().parse::<f64>().unwrap_or_else(|_| {
                debug!(key, value = %raw, default, "malformed float, using default");
                default
            }),
            None => default,
        }
    }

    fn int(&self, key: &str, default: i64) -> i64 {
        match (self.lookup)(key) {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|_| {
                debug!(key, value = %raw, default, "malformed integer, using default");
                default
            }),
            None => default,
        }
    }

    /// Non-negative count; anything at or below zero becomes zero.
    fn span(&self, key: &str, default: usize) -> usize {
        self.int(key, default as i64).max(0) as usize
    }

    fn pair(&self, enter_key: &str, exit_key: &str, default: ThresholdPair) -> ThresholdPair {
        ThresholdPair::new(
            self.float(enter_key, default.enter),
            self.float(exit_key, default.exit),
        )
    }
}
