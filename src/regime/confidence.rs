//! Coarse reliability flag for a classification.

use serde::{Deserialize, Serialize};

use crate::config::RegimeConfig;

use super::method::ValueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// `High` only when the active window holds at least `min_days` scores and,
/// for statistical transforms, the full history meets that transform's
/// minimum sample count.
pub fn estimate_confidence(
    window_len: usize,
    total_samples: usize,
    min_days: usize,
    kind: Option<ValueKind>,
    config: &RegimeConfig,
) -> Confidence {
    if total_samples == 0 || window_len < min_days {
        return Confidence::Low;
    }
    match kind.and_then(|k| k.min_samples(config)) {
        Some(required) if total_samples < required => Confidence::Low,
        _ => Confidence::High,
    }
}
