//! # Experiment report
//!
//! [`ExperimentReport`] is the JSON-serializable output of [`crate::experiment::ExperimentRunner`]
//! (§6 persisted format); field names are chosen to round-trip through `serde_json` without a
//! custom (de)serializer. [`write_comparison_csv`] exports just the comparison table in the
//! legacy CSV column order.

use serde::{Deserialize, Serialize};

use crate::error::{Error, FailureReason};
use crate::result::Seed;

/// One row of the cross-algorithm comparison table, aggregated over every scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Algorithm name (`"GA"`, `"ACO"`, ...).
    pub algorithm: String,
    /// Fraction of all (case, repeat) cells that produced a valid path.
    pub success_rate: f64,
    /// Fraction of successful cells whose path met the bandwidth demand (should equal
    /// `success_rate` since a successful result always satisfies it, kept distinct for
    /// auditability against [`crate::validity::check`]).
    pub bandwidth_satisfaction_rate: f64,
    /// Mean cost across every successful cell.
    pub overall_avg_cost: f64,
    /// Mean wall-clock time across every cell, successful or not, in milliseconds.
    pub overall_avg_time_ms: f64,
    /// Lowest cost observed across every cell.
    pub best_cost: f64,
    /// The seed that produced `best_cost`, if any cell succeeded.
    pub best_seed: Option<Seed>,
}

/// Per-(scenario, algorithm) aggregate statistics (§4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// The test case's id.
    pub case_id: String,
    /// The algorithm's name.
    pub algorithm: String,
    /// Mean cost over successful repeats (`f64::INFINITY` if none succeeded).
    pub mean_cost: f64,
    /// Standard deviation of cost over successful repeats.
    pub std_cost: f64,
    /// Minimum cost over successful repeats.
    pub min_cost: f64,
    /// Maximum cost over successful repeats.
    pub max_cost: f64,
    /// Mean wall-clock time over all repeats, in milliseconds.
    pub mean_time_ms: f64,
    /// Standard deviation of wall-clock time over all repeats.
    pub std_time_ms: f64,
    /// Minimum wall-clock time over all repeats.
    pub min_time_ms: f64,
    /// Maximum wall-clock time over all repeats.
    pub max_time_ms: f64,
    /// Fraction of repeats that succeeded.
    pub success_rate: f64,
    /// Fraction of repeats whose result met the bandwidth demand.
    pub bandwidth_satisfaction_rate: f64,
    /// The seed with the lowest cost among successful repeats, if any.
    pub best_seed: Option<Seed>,
}

/// Count of 1st/2nd/3rd-place finishes for one algorithm across every scenario (§4.9 ranking).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// The algorithm's name.
    pub algorithm: String,
    /// Number of scenarios where this algorithm ranked 1st by mean cost.
    pub first_places: usize,
    /// Number of scenarios where this algorithm ranked 2nd.
    pub second_places: usize,
    /// Number of scenarios where this algorithm ranked 3rd.
    pub third_places: usize,
}

/// One grouped count of failures for a given (case, algorithm, reason) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// The test case's id.
    pub case_id: String,
    /// The algorithm's name.
    pub algorithm: String,
    /// The failure taxonomy code.
    pub reason: FailureReason,
    /// Number of repeats that failed with this reason for this (case, algorithm).
    pub count: usize,
}

/// Every failure observed during a run, grouped by reason and by algorithm (§4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FailureReport {
    /// Total number of failed (case, algorithm, repeat) cells.
    pub total_failures: usize,
    /// Grouped failure counts.
    pub details: Vec<FailureDetail>,
}

/// The full exported result of an experiment run (§6 JSON keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Unix timestamp (seconds) when the run completed.
    pub timestamp: u64,
    /// Number of test cases run.
    pub n_test_cases: usize,
    /// Number of repeats per (case, algorithm) cell.
    pub n_repeats: usize,
    /// Total wall-clock time of the whole run, in seconds.
    pub total_time_sec: f64,
    /// Cross-algorithm comparison table.
    pub comparison_table: Vec<ComparisonRow>,
    /// Per-(scenario, algorithm) aggregates.
    pub scenario_results: Vec<ScenarioResult>,
    /// Per-algorithm 1st/2nd/3rd place counts.
    pub ranking_summary: Vec<RankingEntry>,
    /// Grouped failure report.
    pub failure_report: FailureReport,
}

/// Serialize `report` as pretty-printed JSON, matching the persisted field names of §6.
pub fn to_json_string(report: &ExperimentReport) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Parse an `ExperimentReport` previously written by [`to_json_string`].
pub fn from_json_str(s: &str) -> Result<ExperimentReport, Error> {
    Ok(serde_json::from_str(s)?)
}

/// Write the comparison table as CSV with the exact column order of §6:
/// `algorithm, success_rate, bandwidth_satisfaction_rate, overall_avg_cost, overall_avg_time_ms,
/// best_cost, best_seed`.
pub fn write_comparison_csv(report: &ExperimentReport, writer: impl std::io::Write) -> Result<(), Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["algorithm", "success_rate", "bandwidth_satisfaction_rate", "overall_avg_cost", "overall_avg_time_ms", "best_cost", "best_seed"])?;
    for row in &report.comparison_table {
        w.write_record([
            row.algorithm.clone(),
            row.success_rate.to_string(),
            row.bandwidth_satisfaction_rate.to_string(),
            row.overall_avg_cost.to_string(),
            row.overall_avg_time_ms.to_string(),
            row.best_cost.to_string(),
            row.best_seed.map(|s| s.to_string()).unwrap_or_default(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_report() -> ExperimentReport {
        ExperimentReport {
            timestamp: 1_700_000_000,
            n_test_cases: 1,
            n_repeats: 1,
            total_time_sec: 0.5,
            comparison_table: vec![ComparisonRow {
                algorithm: "GA".to_string(),
                success_rate: 1.0,
                bandwidth_satisfaction_rate: 1.0,
                overall_avg_cost: 0.42,
                overall_avg_time_ms: 12.3,
                best_cost: 0.4,
                best_seed: Some(7),
            }],
            scenario_results: Vec::new(),
            ranking_summary: Vec::new(),
            failure_report: FailureReport::default(),
        }
    }

    #[test]
    fn json_round_trips() {
        let report = sample_report();
        let json = to_json_string(&report).unwrap();
        let parsed = from_json_str(&json).unwrap();
        assert_eq!(report, parsed);
    }

    #[test]
    fn csv_export_has_expected_header() {
        let report = sample_report();
        let mut buf = Vec::new();
        write_comparison_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("algorithm,success_rate,bandwidth_satisfaction_rate,overall_avg_cost,overall_avg_time_ms,best_cost,best_seed"));
    }
}
