//! Regime phase classification.
//!
//! Turns a daily phase score series into a sticky discrete phase:
//! - Phase 1 (expansion): windowed score below the speculation band
//! - Phase 2 (speculation): inside the band
//! - Phase 3 (break): at or above the break threshold
//!
//! The score is compared raw, as a z-score, or as a percentile rank depending
//! on how much history backs it, or as dictated by a calibration artifact.

pub mod calibration;
pub mod classifier;
pub mod computer;
pub mod confidence;
pub mod method;
pub mod thresholds;
pub mod transform;
pub mod trend;

pub use calibration::{CalibrationConfig, CalibrationError};
pub use classifier::{apply_hysteresis, classify_direct, phase_from_score, phase_stats, PhaseStats, RegimePhase};
pub use computer::{latest_known_phase, PhaseRecord, RegimeComputer, RegimeResult};
pub use confidence::{estimate_confidence, Confidence};
pub use method::{select_method, RegimeMethod, SelectedMethod, ValueKind};
pub use thresholds::{normalize_pair, MethodThresholds, ThresholdSet};
pub use transform::{percentile_rank, transform, windowed_mean, zscore, Transformed};
pub use trend::{estimate_trend, Trend, TrendEstimate};
