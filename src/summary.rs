//! Cross-venue summary statistics.
//!
//! The summary is rebuilt from the latest metrics snapshot on every call.
//! Every `ev_<venue>` block present contributes; nothing here names a venue.

use std::collections::BTreeMap;

use crate::models::{MetricsSnapshot, Record, Summary, VenueBreakdown, WinRate};

/// Seconds between metrics snapshots written upstream.
///
/// Uptime is approximated as snapshots observed times this interval. Gaps or
/// a changed cadence upstream skew it; there is no wall-clock source to do better.
pub const METRICS_SAMPLE_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// The metrics log has no snapshot yet.
    NoData,
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::NoData => write!(f, "no metrics snapshot available"),
        }
    }
}

impl std::error::Error for SummaryError {}

/// Roll up per-venue stats from the latest metrics record.
///
/// `metrics_observed` is the number of metrics records read (uptime proxy),
/// `signal_count` the number of records in the signal log.
pub fn summarize(
    latest: Option<&Record>,
    metrics_observed: usize,
    signal_count: usize,
) -> Result<Summary, SummaryError> {
    let latest = latest.ok_or(SummaryError::NoData)?;
    let snapshot = MetricsSnapshot::from_record(latest);

    let mut total_trades = 0i64;
    let mut wins = 0i64;
    let mut losses = 0i64;
    let mut total_pnl = 0.0;
    let mut by_leader = BTreeMap::new();

    for (venue, stats) in snapshot.venue_stats() {
        let pnl = stats.realized_pnl();

        // Counts come straight from upstream; clamp instead of wrapping.
        total_trades = total_trades.saturating_add(stats.count);
        wins = wins.saturating_add(stats.win_count);
        losses = losses.saturating_add(stats.loss_count);
        total_pnl += pnl;

        by_leader.insert(
            venue,
            VenueBreakdown {
                trades: stats.count,
                pnl: round_to(pnl, 2),
            },
        );
    }

    let decided = wins.saturating_add(losses);
    let win_rate = if decided > 0 {
        WinRate::Percent(round_to(wins as f64 / decided as f64 * 100.0, 1))
    } else {
        WinRate::Undecided
    };

    Ok(Summary {
        uptime_seconds: metrics_observed as u64 * METRICS_SAMPLE_INTERVAL_SECS,
        total_signals: signal_count,
        total_trades,
        total_pnl_bps: round_to(total_pnl, 2),
        wins,
        losses,
        win_rate,
        by_leader,
        latency: snapshot.latency,
        ev: snapshot.ev,
    })
}

/// Round to `decimals` places, ties to even on the exact binary value.
///
/// Goes through the formatter rather than `f64::round`, which rounds ties away
/// from zero and would report 6.25% as 6.3.
fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn two_venue_record() -> Record {
        record(json!({
            "ts_unix_ns": 1_000_000_000i64,
            "ev_A": { "Count": 10, "WinCount": 7, "LossCount": 3, "AvgProfit": 2.0, "AvgLoss": 1.0 },
            "ev_B": { "Count": 5, "WinCount": 2, "LossCount": 3, "AvgProfit": 1.0, "AvgLoss": 0.5 },
            "latency_A": { "ArrivedP50Ms": 4.2 }
        }))
    }

    #[test]
    fn test_two_venue_rollup() {
        let summary = summarize(Some(&two_venue_record()), 3, 42).unwrap();

        assert_eq!(summary.total_trades, 15);
        assert_eq!(summary.wins, 9);
        assert_eq!(summary.losses, 6);
        assert_eq!(summary.win_rate, WinRate::Percent(60.0));
        assert_eq!(summary.by_leader["A"], VenueBreakdown { trades: 10, pnl: 11.0 });
        assert_eq!(summary.by_leader["B"], VenueBreakdown { trades: 5, pnl: 0.5 });
        assert_eq!(summary.total_pnl_bps, 11.5);
        assert_eq!(summary.total_signals, 42);
        assert_eq!(summary.uptime_seconds, 30);
        assert_eq!(summary.latency["A"], json!({ "ArrivedP50Ms": 4.2 }));
        assert_eq!(summary.ev["B"]["Count"], 5);
    }

    #[test]
    fn test_new_venue_is_included() {
        let mut latest = two_venue_record();
        latest.insert(
            "ev_C".to_string(),
            json!({ "Count": 4, "WinCount": 1, "LossCount": 3, "AvgProfit": 3.0, "AvgLoss": 1.0 }),
        );

        let summary = summarize(Some(&latest), 1, 0).unwrap();

        assert_eq!(summary.by_leader.len(), 3);
        assert_eq!(summary.by_leader["C"], VenueBreakdown { trades: 4, pnl: 0.0 });
        assert_eq!(summary.total_trades, 19);
        assert_eq!(summary.wins, 10);
        assert_eq!(summary.losses, 9);
        assert_eq!(summary.win_rate, WinRate::Percent(52.6));
        assert_eq!(summary.total_pnl_bps, 11.5);
    }

    #[test]
    fn test_no_decided_trades_has_zero_win_rate() {
        let latest = record(json!({
            "ev_okx": { "Count": 0 },
            "ev_binance": {}
        }));

        let summary = summarize(Some(&latest), 1, 0).unwrap();
        assert_eq!(summary.win_rate, WinRate::Undecided);
        assert_eq!(summary.total_pnl_bps, 0.0);
        assert_eq!(summary.by_leader["binance"], VenueBreakdown { trades: 0, pnl: 0.0 });
    }

    #[test]
    fn test_absent_latest_is_no_data() {
        assert_eq!(summarize(None, 0, 5), Err(SummaryError::NoData));
    }

    #[test]
    fn test_record_without_stats_blocks() {
        let summary = summarize(Some(&record(json!({ "ts_unix_ns": 1 }))), 1, 0).unwrap();
        assert!(summary.by_leader.is_empty());
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.win_rate, WinRate::Undecided);
    }

    #[test]
    fn test_inconsistent_counts_propagate() {
        // wins + losses > count is upstream's problem; numbers pass through.
        let latest = record(json!({
            "ev_okx": { "Count": 1, "WinCount": 5, "LossCount": 5, "AvgProfit": 1.0, "AvgLoss": -1.0 }
        }));

        let summary = summarize(Some(&latest), 1, 0).unwrap();
        assert_eq!(summary.total_trades, 1);
        assert_eq!(summary.win_rate, WinRate::Percent(50.0));
        assert_eq!(summary.total_pnl_bps, 10.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(11.456, 2), 11.46);
        assert_eq!(round_to(-0.004, 2), 0.0);
        assert_eq!(round_to(66.666, 1), 66.7);
    }

    #[test]
    fn test_round_to_ties_go_to_even() {
        assert_eq!(round_to(6.25, 1), 6.2);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        // 2.675 is stored just below the tie
        assert_eq!(round_to(2.675, 2), 2.67);
    }

    #[test]
    fn test_exact_tie_win_rate_and_pnl() {
        let latest = record(json!({
            "ev_okx": { "Count": 16, "WinCount": 1, "LossCount": 15, "AvgProfit": 0.125, "AvgLoss": 0.0 }
        }));

        let summary = summarize(Some(&latest), 1, 0).unwrap();
        assert_eq!(summary.win_rate, WinRate::Percent(6.2));
        assert_eq!(summary.total_pnl_bps, 0.12);
        assert_eq!(summary.by_leader["okx"].pnl, 0.12);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let latest = record(json!({
            "ev_a": { "Count": i64::MAX, "WinCount": i64::MAX, "LossCount": 0 },
            "ev_b": { "Count": i64::MAX, "WinCount": 1, "LossCount": i64::MAX },
            "ev_c": { "Count": u64::MAX }
        }));

        let summary = summarize(Some(&latest), 1, 0).unwrap();
        assert_eq!(summary.total_trades, i64::MAX);
        assert_eq!(summary.wins, i64::MAX);
        assert_eq!(summary.losses, i64::MAX);
        assert_eq!(summary.win_rate, WinRate::Percent(100.0));
        assert_eq!(summary.by_leader["c"].trades, i64::MAX);
    }

    #[test]
    fn test_undecided_win_rate_serializes_as_integer_zero() {
        let summary = summarize(Some(&record(json!({ "ev_okx": {} }))), 1, 0).unwrap();
        let body = serde_json::to_value(&summary).unwrap();
        assert!(body["win_rate"].is_u64());
        assert_eq!(body["win_rate"], 0);

        let summary = summarize(Some(&two_venue_record()), 1, 0).unwrap();
        let body = serde_json::to_value(&summary).unwrap();
        assert!(body["win_rate"].is_f64());
        assert_eq!(body["win_rate"], 60.0);
    }
}
