//! Regime phases and the hysteresis classifier.
//!
//! Each phase band is entered at one threshold and left at a lower one, so a
//! value hovering near a boundary keeps its current phase.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::thresholds::ThresholdSet;
use super::RegimeResult;

/// Macro regime phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimePhase {
    /// Low stress, expanding market.
    Phase1,
    /// Elevated stress, speculative excess.
    Phase2,
    /// High stress, break.
    Phase3,
    /// No prior state or no input.
    Unknown,
}

impl RegimePhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Phase1 => "Phase 1 - Expansion",
            Self::Phase2 => "Phase 2 - Speculation",
            Self::Phase3 => "Phase 3 - Break",
            Self::Unknown => "Unknown phase",
        }
    }

    /// Description of the phase.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Phase1 => "Stress below the speculation band",
            Self::Phase2 => "Stress inside the speculation band",
            Self::Phase3 => "Stress at or above the break threshold",
            Self::Unknown => "Not enough data to classify",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for RegimePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify without hysteresis.
pub fn classify_direct(value: f64, thresholds: &ThresholdSet) -> RegimePhase {
    if value >= thresholds.phase3_enter {
        RegimePhase::Phase3
    } else if value >= thresholds.phase2_enter {
        RegimePhase::Phase2
    } else {
        RegimePhase::Phase1
    }
}

/// Classify a daily score against the absolute thresholds.
pub fn phase_from_score(score: Option<f64>, absolute: &ThresholdSet) -> RegimePhase {
    match score {
        Some(s) => classify_direct(s, absolute),
        None => RegimePhase::Unknown,
    }
}

/// Next phase given the previous one and the current comparable value.
pub fn apply_hysteresis(
    value: Option<f64>,
    previous: Option<RegimePhase>,
    thresholds: &ThresholdSet,
) -> RegimePhase {
    let Some(value) = value else {
        return previous.unwrap_or(RegimePhase::Unknown);
    };

    match previous {
        Some(RegimePhase::Phase3) => {
            if value < thresholds.phase3_exit {
                if value >= thresholds.phase2_enter {
                    RegimePhase::Phase2
                } else {
                    RegimePhase::Phase1
                }
            } else {
                RegimePhase::Phase3
            }
        }
        Some(RegimePhase::Phase2) => {
            if value >= thresholds.phase3_enter {
                RegimePhase::Phase3
            } else if value < thresholds.phase2_exit {
                RegimePhase::Phase1
            } else {
                RegimePhase::Phase2
            }
        }
        Some(RegimePhase::Phase1) | Some(RegimePhase::Unknown) | None => {
            classify_direct(value, thresholds)
        }
    }
}

/// Statistics for a phase over a replayed history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStats {
    pub phase: RegimePhase,
    pub days: usize,
    pub pct_of_total: f64,
    pub avg_score: f64,
}

impl Default for PhaseStats {
    fn default() -> Self {
        Self {
            phase: RegimePhase::Unknown,
            days: 0,
            pct_of_total: 0.0,
            avg_score: 0.0,
        }
    }
}

/// Per-phase day counts and average windowed score.
pub fn phase_stats(replay: &[(NaiveDate, RegimeResult)]) -> HashMap<RegimePhase, PhaseStats> {
    let mut stats: HashMap<RegimePhase, PhaseStats> = HashMap::new();
    let mut score_sums: HashMap<RegimePhase, (f64, usize)> = HashMap::new();
    let total_days = replay.len();

    for (_, result) in replay {
        let entry = stats.entry(result.phase).or_insert_with(|| PhaseStats {
            phase: result.phase,
            ..Default::default()
        });
        entry.days += 1;

        if let Some(score) = result.score {
            let sum = score_sums.entry(result.phase).or_insert((0.0, 0));
            sum.0 += score;
            sum.1 += 1;
        }
    }

    for entry in stats.values_mut() {
        entry.pct_of_total = entry.days as f64 / total_days as f64 * 100.0;
        if let Some((sum, n)) = score_sums.get(&entry.phase) {
            if *n > 0 {
                entry.avg_score = sum / *n as f64;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{Confidence, Trend, ValueKind};

    fn absolute() -> ThresholdSet {
        ThresholdSet::normalized(2.0, Some(1.5), 4.0, Some(3.0))
    }

    #[test]
    fn test_direct_classification() {
        let t = absolute();
        assert_eq!(classify_direct(1.99, &t), RegimePhase::Phase1);
        assert_eq!(classify_direct(2.0, &t), RegimePhase::Phase2);
        assert_eq!(classify_direct(3.99, &t), RegimePhase::Phase2);
        assert_eq!(classify_direct(4.0, &t), RegimePhase::Phase3);
    }

    #[test]
    fn test_first_classification_has_no_hysteresis() {
        let t = absolute();
        for v in [0.0, 1.7, 2.0, 3.5, 4.0, 9.0] {
            assert_eq!(apply_hysteresis(Some(v), None, &t), classify_direct(v, &t));
            assert_eq!(
                apply_hysteresis(Some(v), Some(RegimePhase::Unknown), &t),
                classify_direct(v, &t)
            );
        }
    }

    #[test]
    fn test_phase2_band_is_sticky() {
        let t = absolute();
        let mut phase = RegimePhase::Phase2;
        for v in [1.5, 3.99, 1.6, 3.0, 2.0, 1.9, 3.9] {
            phase = apply_hysteresis(Some(v), Some(phase), &t);
            assert_eq!(phase, RegimePhase::Phase2, "value {v} left phase 2");
        }
    }

    #[test]
    fn test_phase2_transitions() {
        let t = absolute();
        assert_eq!(apply_hysteresis(Some(4.0), Some(RegimePhase::Phase2), &t), RegimePhase::Phase3);
        assert_eq!(apply_hysteresis(Some(1.49), Some(RegimePhase::Phase2), &t), RegimePhase::Phase1);
    }

    #[test]
    fn test_phase3_exit() {
        let t = absolute();
        assert_eq!(apply_hysteresis(Some(3.0), Some(RegimePhase::Phase3), &t), RegimePhase::Phase3);
        assert_eq!(apply_hysteresis(Some(2.99), Some(RegimePhase::Phase3), &t), RegimePhase::Phase2);
        assert_eq!(apply_hysteresis(Some(1.99), Some(RegimePhase::Phase3), &t), RegimePhase::Phase1);
    }

    #[test]
    fn test_null_value_keeps_previous() {
        let t = absolute();
        assert_eq!(apply_hysteresis(None, Some(RegimePhase::Phase3), &t), RegimePhase::Phase3);
        assert_eq!(apply_hysteresis(None, None, &t), RegimePhase::Unknown);
    }

    #[test]
    fn test_phase_from_score() {
        let t = absolute();
        assert_eq!(phase_from_score(Some(5.0), &t), RegimePhase::Phase3);
        assert_eq!(phase_from_score(None, &t), RegimePhase::Unknown);
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(serde_json::to_string(&RegimePhase::Phase2).unwrap(), "\"phase2\"");
        assert_eq!(RegimePhase::Phase3.to_string(), "Phase 3 - Break");
        assert!(!RegimePhase::Unknown.is_known());
    }

    #[test]
    fn test_stats_calculation() {
        let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let result = |phase, score| RegimeResult {
            phase,
            score: Some(score),
            value: Some(score),
            method: Some(ValueKind::Absolute),
            calibrated: false,
            trend: Some(Trend::Stable),
            trend_score: None,
            confidence: Confidence::High,
            window_days: 7,
        };
        let replay: Vec<_> = (0..4)
            .map(|i| {
                let (phase, score) = if i < 3 { (RegimePhase::Phase1, 1.0 + i as f64) } else { (RegimePhase::Phase3, 4.5) };
                (base + chrono::Duration::days(i), result(phase, score))
            })
            .collect();

        let stats = phase_stats(&replay);
        assert_eq!(stats[&RegimePhase::Phase1].days, 3);
        assert_eq!(stats[&RegimePhase::Phase1].pct_of_total, 75.0);
        assert_eq!(stats[&RegimePhase::Phase1].avg_score, 2.0);
        assert_eq!(stats[&RegimePhase::Phase3].avg_score, 4.5);
        assert!(!stats.contains_key(&RegimePhase::Phase2));
    }
}
