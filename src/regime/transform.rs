//! Conversion of the windowed mean into a method-comparable value.

use statrs::statistics::Statistics;
use tracing::debug;

use super::method::ValueKind;

/// Last `n` scores, or all of them when `n` is zero or exceeds the length.
pub fn tail(scores: &[f64], n: usize) -> &[f64] {
    if n == 0 || n >= scores.len() {
        scores
    } else {
        &scores[scores.len() - n..]
    }
}

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean of the last `window_days` scores. `None` for an empty series.
pub fn windowed_mean(scores: &[f64], window_days: usize) -> Option<f64> {
    mean(tail(scores, window_days))
}

/// Standardize `current` against the lookback window.
///
/// `None` when the window is empty or has zero population variance.
pub fn zscore(scores: &[f64], current: f64, lookback: usize) -> Option<f64> {
    let sample = tail(scores, lookback);
    let center = mean(sample)?;
    let std = sample.iter().population_std_dev();
    if std > 0.0 {
        Some((current - center) / std)
    } else {
        None
    }
}

/// Share of lookback values strictly below `current`, scaled to 0-100.
pub fn percentile_rank(scores: &[f64], current: f64, lookback: usize) -> Option<f64> {
    let sample = tail(scores, lookback);
    if sample.is_empty() {
        return None;
    }
    let below = sample.iter().filter(|&&v| v < current).count();
    Some(below as f64 / sample.len() as f64 * 100.0)
}

/// Value produced by a transform, tagged with the transform that actually ran.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformed {
    pub kind: ValueKind,
    pub value: Option<f64>,
}

/// Transform the windowed mean `current` for comparison under `kind`.
///
/// A z-score over a flat lookback is undefined; that case runs as
/// [`ValueKind::Absolute`] and reports so in the returned kind.
pub fn transform(
    kind: ValueKind,
    current: f64,
    scores: &[f64],
    z_lookback: usize,
    pct_lookback: usize,
) -> Transformed {
    match kind {
        ValueKind::Absolute => Transformed {
            kind,
            value: Some(current),
        },
        ValueKind::ZScore => match zscore(scores, current, z_lookback) {
            Some(value) => Transformed {
                kind,
                value: Some(value),
            },
            None => {
                debug!(current, "zero-variance lookback, falling back to absolute");
                Transformed {
                    kind: ValueKind::Absolute,
                    value: Some(current),
                }
            }
        },
        ValueKind::Percentile => Transformed {
            kind,
            value: percentile_rank(scores, current, pct_lookback),
        },
    }
}
