pub mod config;
pub mod history;
pub mod regime;

// Re-export commonly used types
pub use config::RegimeConfig;
pub use history::{DailySnapshot, HistoryStore, StoreError};
pub use regime::{
    CalibrationConfig, Confidence, RegimeComputer, RegimeMethod, RegimePhase, RegimeResult, ThresholdSet, Trend,
    ValueKind,
};
