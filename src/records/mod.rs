//! Record log ingestion.
//!
//! - `store`: tolerant JSONL loading from a base directory
//! - `snapshot`: latest record and bounded history windows

pub mod snapshot;
pub mod store;

pub use snapshot::{latest_of, recent_of};
pub use store::{RecordStore, RecordStoreError, METRICS_LOG, SIGNALS_LOG, TRADES_LOG};
