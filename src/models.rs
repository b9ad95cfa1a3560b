use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One decoded line of a record log. Schema is imposed by the reader, not here.
pub type Record = Map<String, Value>;

const LATENCY_PREFIX: &str = "latency_";
const EV_PREFIX: &str = "ev_";

/// Per-venue trade outcome counters as carried in an `ev_<venue>` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VenueStats {
    pub count: i64,
    pub win_count: i64,
    pub loss_count: i64,
    pub avg_profit: f64,
    pub avg_loss: f64,
}

impl VenueStats {
    /// Decode a stats block, zeroing anything missing or mistyped.
    ///
    /// The upstream writer emits PascalCase keys (`WinCount`); snake_case is
    /// accepted as well.
    pub fn from_value(value: &Value) -> Self {
        let Some(block) = value.as_object() else {
            return Self::default();
        };

        Self {
            count: int_field(block, &["Count", "count"]),
            win_count: int_field(block, &["WinCount", "win_count"]),
            loss_count: int_field(block, &["LossCount", "loss_count"]),
            avg_profit: float_field(block, &["AvgProfit", "avg_profit"]),
            avg_loss: float_field(block, &["AvgLoss", "avg_loss"]),
        }
    }

    /// Realized PnL: average profit on wins minus average loss on losses.
    /// Both averages are magnitudes.
    pub fn realized_pnl(&self) -> f64 {
        self.avg_profit * self.win_count as f64 - self.avg_loss * self.loss_count as f64
    }
}

fn lookup<'a>(block: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| block.get(*k))
}

fn int_field(block: &Record, keys: &[&str]) -> i64 {
    match lookup(block, keys) {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        None => 0,
    }
}

fn float_field(block: &Record, keys: &[&str]) -> f64 {
    lookup(block, keys).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Typed read-only view over a metrics record.
///
/// Venues are discovered from key names, so a new venue showing up upstream
/// needs no change here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub ts_unix_ns: i64,
    pub connections: BTreeMap<String, Value>,
    pub latency: BTreeMap<String, Value>,
    pub ev: BTreeMap<String, Value>,
    pub updates_per_sec: Vec<Value>,
}

impl MetricsSnapshot {
    pub fn from_record(record: &Record) -> Self {
        let mut snapshot = Self {
            ts_unix_ns: record
                .get("ts_unix_ns")
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .unwrap_or(0),
            updates_per_sec: record
                .get("updates_per_sec")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            ..Self::default()
        };

        for (key, value) in record {
            // A bare `latency_` / `ev_` key names no venue and is not a connection either.
            if let Some(venue) = key.strip_prefix(LATENCY_PREFIX) {
                if !venue.is_empty() {
                    snapshot.latency.insert(venue.to_string(), value.clone());
                }
            } else if let Some(venue) = key.strip_prefix(EV_PREFIX) {
                if !venue.is_empty() {
                    snapshot.ev.insert(venue.to_string(), value.clone());
                }
            } else if value.is_object() {
                snapshot.connections.insert(key.clone(), value.clone());
            }
        }

        snapshot
    }

    /// Snapshot time in seconds since the epoch.
    pub fn timestamp_secs(&self) -> f64 {
        self.ts_unix_ns as f64 / 1e9
    }

    /// Snapshot time as a UTC instant; `None` when the record carried no timestamp.
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        (self.ts_unix_ns > 0).then(|| DateTime::<Utc>::from_timestamp_nanos(self.ts_unix_ns))
    }

    /// Decoded stats for every venue with an `ev_` block.
    pub fn venue_stats(&self) -> BTreeMap<String, VenueStats> {
        self.ev
            .iter()
            .map(|(venue, block)| (venue.clone(), VenueStats::from_value(block)))
            .collect()
    }
}

/// Trades and realized PnL attributed to one leading venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VenueBreakdown {
    pub trades: i64,
    pub pnl: f64,
}

/// Share of decided trades that won.
///
/// With no decided trades there is no rate; it is reported as the integer `0`
/// so dashboards reading the old service see the same JSON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WinRate {
    Undecided,
    /// Percentage, one decimal place
    Percent(f64),
}

impl WinRate {
    pub fn as_percent(&self) -> f64 {
        match self {
            WinRate::Undecided => 0.0,
            WinRate::Percent(p) => *p,
        }
    }
}

impl Serialize for WinRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WinRate::Undecided => serializer.serialize_u64(0),
            WinRate::Percent(p) => serializer.serialize_f64(*p),
        }
    }
}

/// Cross-venue rollup computed from the latest metrics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub uptime_seconds: u64,
    pub total_signals: usize,
    pub total_trades: i64,
    pub total_pnl_bps: f64,
    pub wins: i64,
    pub losses: i64,
    pub win_rate: WinRate,
    pub by_leader: BTreeMap<String, VenueBreakdown>,
    pub latency: BTreeMap<String, Value>,
    pub ev: BTreeMap<String, Value>,
}

/// Resolved runtime configuration (see `main.rs` for the CLI/env sources).
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub history_limit: usize,
}

pub const DEFAULT_OUTPUT_DIR: &str = "/opt/latency-validator/output";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8088";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_HISTORY_LIMIT: usize = 100;
