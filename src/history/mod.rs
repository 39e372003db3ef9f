pub mod store;
pub mod types;

pub use store::{HistoryStore, StoreError, StoreResult};
pub use types::{DailySnapshot, MarketReadings};
