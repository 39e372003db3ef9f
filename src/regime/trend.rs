//! Trend of the phase score across two adjacent sub-windows.

use serde::{Deserialize, Serialize};

use super::transform::mean;

/// Score change at or beyond which the trend is directional.
pub const TREND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

/// Trend label plus the raw difference of means, when computable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendEstimate {
    pub trend: Trend,
    pub score: Option<f64>,
}

/// Compare the mean of the last `trend_days` scores with the mean of the
/// `trend_days` scores before them.
pub fn estimate_trend(scores: &[f64], trend_days: usize) -> TrendEstimate {
    let stable = TrendEstimate {
        trend: Trend::Stable,
        score: None,
    };
    let Some(needed) = trend_days.checked_mul(2) else {
        return stable;
    };
    if trend_days == 0 || scores.len() < needed {
        return stable;
    }

    let split = scores.len() - trend_days;
    let recent = &scores[split..];
    let previous = &scores[split - trend_days..split];

    let (Some(recent_mean), Some(previous_mean)) = (mean(recent), mean(previous)) else {
        return stable;
    };
    let delta = recent_mean - previous_mean;

    let trend = if delta >= TREND_THRESHOLD {
        Trend::Rising
    } else if delta <= -TREND_THRESHOLD {
        Trend::Falling
    } else {
        Trend::Stable
    };

    TrendEstimate {
        trend,
        score: Some(delta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_trend_window_is_stable() {
        let est = estimate_trend(&[1.0, 2.0], usize::MAX / 2 + 1);
        assert_eq!(est.trend, Trend::Stable);
        assert_eq!(est.score, None);
    }

    #[test]
    fn test_rising() {
        let scores = [1.0, 1.0, 2.0, 3.0, 4.0, 4.0, 4.0, 5.0, 5.0, 5.0];
        let est = estimate_trend(&scores, 3);
        assert_eq!(est.trend, Trend::Rising);
        assert_eq!(est.score, Some(1.0));
    }

    #[test]
    fn test_falling() {
        let scores = [5.0, 5.0, 4.0, 3.0, 3.0, 3.0];
        let est = estimate_trend(&scores, 2);
        // recent [3, 3] vs previous [4, 3]
        assert_eq!(est.trend, Trend::Falling);
        assert_eq!(est.score, Some(-0.5));
    }

    #[test]
    fn test_flat_is_stable() {
        let est = estimate_trend(&[1.0; 10], 3);
        assert_eq!(est.trend, Trend::Stable);
        assert_eq!(est.score, Some(0.0));
    }

    #[test]
    fn test_small_change_is_stable() {
        let est = estimate_trend(&[2.0, 2.0, 2.25, 2.25], 2);
        assert_eq!(est.trend, Trend::Stable);
        assert_eq!(est.score, Some(0.25));
    }

    #[test]
    fn test_insufficient_history() {
        assert_eq!(
            estimate_trend(&[1.0, 2.0, 3.0, 4.0, 5.0], 3),
            TrendEstimate { trend: Trend::Stable, score: None }
        );
        assert_eq!(estimate_trend(&[1.0, 9.0], 0).score, None);
    }
}
