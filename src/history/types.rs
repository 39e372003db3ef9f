//! Daily snapshot record.
//!
//! One row per calendar date. The engine reads only `phase_score` and
//! `regime_phase`; everything else is carried for reporting.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::regime::{Confidence, PhaseRecord, RegimePhase, RegimeResult, Trend};

/// Market readings captured alongside the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketReadings {
    pub spx: Option<f64>,
    pub vix: Option<f64>,
    /// High-yield credit spread (%).
    pub spread: Option<f64>,
    pub us10y: Option<f64>,
    pub dxy: Option<f64>,
    /// Net liquidity in billions.
    pub net_liq_b: Option<f64>,
    pub gold: Option<f64>,
    pub btc: Option<f64>,
}

/// A single day of history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    /// Trading date (primary key)
    pub date: NaiveDate,

    /// When the run producing this row happened
    #[serde(default)]
    pub run_ts: Option<NaiveDateTime>,

    /// Headline event for the day (e.g. "NORMAL")
    #[serde(default)]
    pub event: Option<String>,

    #[serde(default)]
    pub stress_score: Option<i64>,

    #[serde(default)]
    pub stress_level: Option<String>,

    /// Phase of the raw daily score, without hysteresis
    #[serde(default)]
    pub phase_daily: Option<RegimePhase>,

    /// Engine input
    #[serde(default)]
    pub phase_score: Option<f64>,

    #[serde(default)]
    pub regime_phase: Option<RegimePhase>,

    #[serde(default)]
    pub regime_score: Option<f64>,

    #[serde(default)]
    pub regime_trend: Option<Trend>,

    #[serde(default)]
    pub regime_confidence: Option<Confidence>,

    #[serde(flatten)]
    pub market: MarketReadings,

    /// Names of the signals that fired
    #[serde(default)]
    pub triggers: Vec<String>,

    #[serde(default)]
    pub reason: Option<String>,
}

impl DailySnapshot {
    /// Empty snapshot for a date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            run_ts: None,
            event: None,
            stress_score: None,
            stress_level: None,
            phase_daily: None,
            phase_score: None,
            regime_phase: None,
            regime_score: None,
            regime_trend: None,
            regime_confidence: None,
            market: MarketReadings::default(),
            triggers: Vec::new(),
            reason: None,
        }
    }

    pub fn with_phase_score(mut self, score: f64) -> Self {
        self.phase_score = Some(score);
        self
    }

    /// Copy the regime fields of a computation onto this row.
    pub fn apply_regime(&mut self, result: &RegimeResult) {
        self.regime_phase = Some(result.phase);
        self.regime_score = result.score;
        self.regime_trend = result.trend;
        self.regime_confidence = Some(result.confidence);
    }

    pub fn clear_regime(&mut self) {
        self.regime_phase = None;
        self.regime_score = None;
        self.regime_trend = None;
        self.regime_confidence = None;
    }
}

impl PhaseRecord for DailySnapshot {
    fn phase_score(&self) -> Option<f64> {
        self.phase_score
    }

    fn regime_phase(&self) -> Option<RegimePhase> {
        self.regime_phase
    }
}
