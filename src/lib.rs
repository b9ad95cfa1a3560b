//! Latency-arbitrage monitoring backend.
//!
//! Serves read-only views over the JSONL logs written by the measurement
//! process: latest snapshot, bounded histories and a cross-venue summary.

pub mod api;
pub mod middleware;
pub mod models;
pub mod records;
pub mod summary;

pub use models::{Config, MetricsSnapshot, Record, Summary, VenueBreakdown, VenueStats, WinRate};
pub use records::{latest_of, recent_of, RecordStore, RecordStoreError};
pub use summary::{summarize, SummaryError, METRICS_SAMPLE_INTERVAL_SECS};
