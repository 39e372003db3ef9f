//! Regime computation over a score history.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegimeConfig;
use crate::history::DailySnapshot;

use super::calibration::CalibrationConfig;
use super::classifier::{apply_hysteresis, phase_from_score, RegimePhase};
use super::confidence::{estimate_confidence, Confidence};
use super::method::{select_method, SelectedMethod, ValueKind};
use super::thresholds::MethodThresholds;
use super::transform::{tail, transform};
use super::trend::{estimate_trend, Trend};

/// A record the engine can read a score and a prior phase from.
pub trait PhaseRecord {
    fn phase_score(&self) -> Option<f64>;
    fn regime_phase(&self) -> Option<RegimePhase>;
}

/// Outcome of one regime computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeResult {
    pub phase: RegimePhase,
    /// Windowed mean of the phase score.
    pub score: Option<f64>,
    /// Windowed mean after the method's transform.
    pub value: Option<f64>,
    /// Transform that actually ran.
    pub method: Option<ValueKind>,
    /// Whether thresholds came from a calibration artifact.
    pub calibrated: bool,
    pub trend: Option<Trend>,
    pub trend_score: Option<f64>,
    pub confidence: Confidence,
    pub window_days: usize,
}

impl RegimeResult {
    fn empty(window_days: usize) -> Self {
        Self {
            phase: RegimePhase::Unknown,
            score: None,
            value: None,
            method: None,
            calibrated: false,
            trend: None,
            trend_score: None,
            confidence: Confidence::Low,
            window_days,
        }
    }
}

/// Most recent phase recorded in the history, `Unknown` included.
pub fn latest_known_phase<R: PhaseRecord>(history: &[R]) -> Option<RegimePhase> {
    history.iter().rev().find_map(|r| r.regime_phase())
}

/// Stateless regime engine.
#[derive(Debug, Clone)]
pub struct RegimeComputer {
    config: RegimeConfig,
    thresholds: MethodThresholds,
}

impl RegimeComputer {
    pub fn new(config: RegimeConfig) -> Self {
        let thresholds = MethodThresholds::resolve(&config);
        Self { config, thresholds }
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &MethodThresholds {
        &self.thresholds
    }

    /// Load the configured calibration artifact, if any.
    pub fn calibration(&self) -> Option<CalibrationConfig> {
        self.config
            .calibration_path
            .as_deref()
            .and_then(CalibrationConfig::load)
    }

    /// Compute the regime for the latest point of `history` (ascending by date).
    pub fn compute<R: PhaseRecord>(
        &self,
        history: &[R],
        window_days: usize,
        trend_days: usize,
        min_days: usize,
    ) -> RegimeResult {
        let calibration = self.calibration();
        self.compute_with(history, window_days, trend_days, min_days, calibration.as_ref())
    }

    /// Same as [`compute`](Self::compute) with an already loaded calibration.
    pub fn compute_with<R: PhaseRecord>(
        &self,
        history: &[R],
        window_days: usize,
        trend_days: usize,
        min_days: usize,
        calibration: Option<&CalibrationConfig>,
    ) -> RegimeResult {
        let scores: Vec<f64> = history.iter().filter_map(|r| r.phase_score()).collect();
        let Some(&last_score) = scores.last() else {
            return RegimeResult::empty(window_days);
        };

        let window = tail(&scores, window_days);
        let regime_score = window.iter().sum::<f64>() / window.len() as f64;

        let previous = latest_known_phase(history)
            .unwrap_or_else(|| phase_from_score(Some(last_score), &self.thresholds.absolute));

        let selected = select_method(scores.len(), self.config.method, calibration, &self.config);
        let transformed = transform(
            selected.value_kind(),
            regime_score,
            &scores,
            self.config.z_lookback,
            self.config.pct_lookback,
        );

        let thresholds = match &selected {
            SelectedMethod::Calibrated(c) if transformed.kind == c.value_type => c.thresholds,
            _ => *self.thresholds.for_kind(transformed.kind),
        };

        debug!(
            samples = scores.len(),
            selected = selected.name(),
            executed = %transformed.kind,
            regime_score,
            "regime method resolved"
        );

        let phase = apply_hysteresis(transformed.value, Some(previous), &thresholds);
        let trend = estimate_trend(&scores, trend_days);
        let confidence = estimate_confidence(
            window.len(),
            scores.len(),
            min_days,
            Some(transformed.kind),
            &self.config,
        );

        RegimeResult {
            phase,
            score: Some(round2(regime_score)),
            value: transformed.value.map(round2),
            method: Some(transformed.kind),
            calibrated: selected.is_calibrated() && transformed.kind == selected.value_kind(),
            trend: Some(trend.trend),
            trend_score: trend.score.map(round2),
            confidence,
            window_days,
        }
    }

    /// Recompute the regime day by day, feeding each computed phase forward
    /// as the next day's previous phase.
    pub fn replay(
        &self,
        history: &[DailySnapshot],
        window_days: usize,
        trend_days: usize,
        min_days: usize,
    ) -> Vec<(NaiveDate, RegimeResult)> {
        let calibration = self.calibration();
        let mut working: Vec<DailySnapshot> = history
            .iter()
            .cloned()
            .map(|mut s| {
                s.clear_regime();
                s
            })
            .collect();

        let mut out = Vec::with_capacity(working.len());
        for i in 0..working.len() {
            let result = self.compute_with(
                &working[..=i],
                window_days,
                trend_days,
                min_days,
                calibration.as_ref(),
            );
            working[i].apply_regime(&result);
            out.push((working[i].date, result));
        }
        out
    }
}

/// Round to two decimals, half to even on the exact binary value.
pub(crate) fn round2_decimal(x: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(x).map(|d| d.round_dp(2))
}

fn round2(x: f64) -> f64 {
    round2_decimal(x).and_then(|d| d.to_f64()).unwrap_or(x)
}
