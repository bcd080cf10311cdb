//! # Experiment runner (§4.9)
//!
//! Drives the (test case × algorithm × repeat) matrix, aggregates mean/std/min/max of cost and
//! time per cell, ranks algorithms per scenario (ties broken by lower mean time, then algorithm
//! name — §9 resolved open question), and groups failures by reason and algorithm. Cell
//! execution mirrors the grounding stack's thread-per-task runner (`snowcap_bencher`'s
//! `runner_strategy`), but uses `std::thread::scope` so cells can borrow the graph directly
//! instead of requiring `Arc`.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{error, warn};

use crate::config::EngineConfig;
use crate::error::{Error, FailureReason};
use crate::graph::Graph;
use crate::optimizers::{AntColony, CancelFlag, GeneticAlgorithm, Optimizer, ParticleSwarm, QLearning, Sarsa, SimulatedAnnealing};
use crate::report::{ComparisonRow, ExperimentReport, FailureDetail, FailureReport, RankingEntry, ScenarioResult};
use crate::result::{OptResult, Seed, TestCase};
use crate::rng::derive_seed;

/// Resolve an algorithm's display name to a fresh, configured optimizer instance. Matching is
/// case-insensitive. `None` for an unrecognized name.
pub fn algorithm_by_name(name: &str, config: &EngineConfig) -> Option<Box<dyn Optimizer + Send + Sync>> {
    match name.to_ascii_uppercase().as_str() {
        "GA" => Some(Box::new(GeneticAlgorithm::new(config.ga))),
        "ACO" => Some(Box::new(AntColony::new(config.aco))),
        "PSO" => Some(Box::new(ParticleSwarm::new(config.pso))),
        "SA" => Some(Box::new(SimulatedAnnealing::new(config.sa))),
        "QL" => Some(Box::new(QLearning::new(config.ql))),
        "SARSA" => Some(Box::new(Sarsa::new(config.sarsa))),
        _ => None,
    }
}

/// All six algorithm names, in the canonical order used when no explicit list is given.
pub const ALL_ALGORITHMS: [&str; 6] = ["GA", "ACO", "PSO", "SA", "QL", "SARSA"];

fn stats(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (f64::INFINITY, 0.0, f64::INFINITY, f64::INFINITY);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (mean, variance.sqrt(), min, max)
}

/// Drives the experiment matrix over a fixed graph.
pub struct ExperimentRunner {
    config: EngineConfig,
}

impl ExperimentRunner {
    /// Build with explicit algorithm parameters.
    pub fn new(config: EngineConfig) -> Self {
        ExperimentRunner { config }
    }

    /// Build with every algorithm's default parameters.
    pub fn with_defaults() -> Self {
        ExperimentRunner::new(EngineConfig::default())
    }

    /// Run one (case, algorithm, seed) cell, honoring `timeout` if given by running the call on
    /// a scoped thread and setting a [`CancelFlag`] once the deadline passes (§5 cancellation &
    /// timeout).
    fn run_cell(&self, optimizer: &(dyn Optimizer + Send + Sync), graph: &Graph, case: &TestCase, seed: Seed, timeout: Option<Duration>) -> Result<OptResult, Error> {
        let Some(deadline) = timeout else {
            return optimizer.optimize(graph, case.source, case.destination, case.weights, case.bandwidth_requirement, seed, None, None);
        };

        std::thread::scope(|scope| {
            let cancel = CancelFlag::new();
            let cancel_for_thread = cancel.clone();
            let handle = scope.spawn(|| {
                optimizer.optimize(
                    graph,
                    case.source,
                    case.destination,
                    case.weights,
                    case.bandwidth_requirement,
                    seed,
                    None,
                    Some(&cancel_for_thread),
                )
            });

            let start = Instant::now();
            let mut deadline_hit = false;
            while !handle.is_finished() {
                if !deadline_hit && start.elapsed() >= deadline {
                    cancel.cancel();
                    deadline_hit = true;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            handle.join().unwrap_or_else(|_| {
                Ok(OptResult::failure(FailureReason::AlgorithmError, seed, start.elapsed().as_secs_f64() * 1000.0))
            })
        })
    }

    /// Run every (case, algorithm) cell `n_repeats` times and produce the aggregated report.
    pub fn run(&self, graph: &Graph, test_cases: &[TestCase], algorithms: &[String], n_repeats: usize, master_seed: u32, timeout: Option<Duration>) -> ExperimentReport {
        let run_start = Instant::now();

        let mut scenario_results: Vec<ScenarioResult> = Vec::new();
        let mut failure_counts: HashMap<(String, String, FailureReason), usize> = HashMap::new();
        let mut per_algo_costs: HashMap<String, Vec<f64>> = HashMap::new();
        let mut per_algo_times: HashMap<String, Vec<f64>> = HashMap::new();
        let mut per_algo_success: HashMap<String, (usize, usize)> = HashMap::new();
        let mut per_algo_bandwidth: HashMap<String, (usize, usize)> = HashMap::new();
        let mut per_algo_best: HashMap<String, (f64, Option<Seed>)> = HashMap::new();
        let mut rankings: HashMap<String, (usize, usize, usize)> = HashMap::new();

        for (case_idx, case) in test_cases.iter().enumerate() {
            let mut case_standings: Vec<(String, f64, f64)> = Vec::new();

            for (algo_idx, algo_name) in algorithms.iter().enumerate() {
                let Some(optimizer) = algorithm_by_name(algo_name, &self.config) else {
                    warn!("unknown algorithm '{algo_name}', skipping");
                    continue;
                };

                let mut costs = Vec::new();
                let mut times = Vec::new();
                let mut successes = 0usize;
                let mut bandwidth_ok = 0usize;
                let mut best_cost_cell = f64::INFINITY;
                let mut best_seed_cell = None;

                for repeat in 0..n_repeats {
                    let task_index = (algo_idx * n_repeats + repeat) as u64;
                    let seed = derive_seed(master_seed, case_idx as u64, task_index);
                    match self.run_cell(optimizer.as_ref(), graph, case, seed, timeout) {
                        Ok(result) => {
                            times.push(result.computation_time_ms);
                            if result.success {
                                successes += 1;
                                costs.push(result.fitness);
                                if case.bandwidth_requirement <= 0.0 || result.min_bandwidth >= case.bandwidth_requirement {
                                    bandwidth_ok += 1;
                                }
                                if result.fitness < best_cost_cell {
                                    best_cost_cell = result.fitness;
                                    best_seed_cell = Some(seed);
                                }
                                let entry = per_algo_best.entry(algo_name.clone()).or_insert((f64::INFINITY, None));
                                if result.fitness < entry.0 {
                                    *entry = (result.fitness, Some(seed));
                                }
                            } else if let Some(reason) = result.failure_reason {
                                *failure_counts.entry((case.id.clone(), algo_name.clone(), reason)).or_insert(0) += 1;
                            }
                        }
                        Err(e) => {
                            error!("optimizer {algo_name} aborted on case {}: {e}", case.id);
                            *failure_counts.entry((case.id.clone(), algo_name.clone(), FailureReason::AlgorithmError)).or_insert(0) += 1;
                        }
                    }
                }

                let (mean_cost, std_cost, min_cost, max_cost) = stats(&costs);
                let (mean_time_ms, std_time_ms, min_time_ms, max_time_ms) = stats(&times);
                let success_rate = successes as f64 / n_repeats.max(1) as f64;
                let bandwidth_satisfaction_rate = if successes > 0 { bandwidth_ok as f64 / successes as f64 } else { 0.0 };

                scenario_results.push(ScenarioResult {
                    case_id: case.id.clone(),
                    algorithm: algo_name.clone(),
                    mean_cost,
                    std_cost,
                    min_cost,
                    max_cost,
                    mean_time_ms,
                    std_time_ms,
                    min_time_ms,
                    max_time_ms,
                    success_rate,
                    bandwidth_satisfaction_rate,
                    best_seed: best_seed_cell,
                });

                per_algo_costs.entry(algo_name.clone()).or_default().extend(costs);
                per_algo_times.entry(algo_name.clone()).or_default().extend(times);
                let success_entry = per_algo_success.entry(algo_name.clone()).or_insert((0, 0));
                success_entry.0 += successes;
                success_entry.1 += n_repeats;
                let bw_entry = per_algo_bandwidth.entry(algo_name.clone()).or_insert((0, 0));
                bw_entry.0 += bandwidth_ok;
                bw_entry.1 += successes;

                case_standings.push((algo_name.clone(), mean_cost, mean_time_ms));
            }

            case_standings.sort_by(|a, b| {
                if (a.1 - b.1).abs() > 1e-9 {
                    a.1.partial_cmp(&b.1).unwrap()
                } else if (a.2 - b.2).abs() > 1e-9 {
                    a.2.partial_cmp(&b.2).unwrap()
                } else {
                    a.0.cmp(&b.0)
                }
            });
            for (place, (name, _, _)) in case_standings.iter().enumerate() {
                let entry = rankings.entry(name.clone()).or_insert((0, 0, 0));
                match place {
                    0 => entry.0 += 1,
                    1 => entry.1 += 1,
                    2 => entry.2 += 1,
                    _ => {}
                }
            }
        }

        let comparison_table: Vec<ComparisonRow> = algorithms
            .iter()
            .filter(|name| per_algo_success.contains_key(*name))
            .map(|name| {
                let costs = per_algo_costs.get(name).map(Vec::as_slice).unwrap_or(&[]);
                let times = per_algo_times.get(name).map(Vec::as_slice).unwrap_or(&[]);
                let (successes, total) = per_algo_success.get(name).copied().unwrap_or((0, 0));
                let (bw_ok, bw_total) = per_algo_bandwidth.get(name).copied().unwrap_or((0, 0));
                let (best_cost, best_seed) = per_algo_best.get(name).copied().unwrap_or((f64::INFINITY, None));
                ComparisonRow {
                    algorithm: name.clone(),
                    success_rate: if total > 0 { successes as f64 / total as f64 } else { 0.0 },
                    bandwidth_satisfaction_rate: if bw_total > 0 { bw_ok as f64 / bw_total as f64 } else { 0.0 },
                    overall_avg_cost: stats(costs).0,
                    overall_avg_time_ms: stats(times).0,
                    best_cost,
                    best_seed,
                }
            })
            .collect();

        let ranking_summary: Vec<RankingEntry> = algorithms
            .iter()
            .map(|name| {
                let (first, second, third) = rankings.get(name).copied().unwrap_or((0, 0, 0));
                RankingEntry { algorithm: name.clone(), first_places: first, second_places: second, third_places: third }
            })
            .collect();

        let total_failures = failure_counts.values().sum();
        let mut details: Vec<FailureDetail> = failure_counts
            .into_iter()
            .map(|((case_id, algorithm, reason), count)| FailureDetail { case_id, algorithm, reason, count })
            .collect();
        details.sort_by(|a, b| a.case_id.cmp(&b.case_id).then_with(|| a.algorithm.cmp(&b.algorithm)));

        ExperimentReport {
            timestamp: SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0),
            n_test_cases: test_cases.len(),
            n_repeats,
            total_time_sec: run_start.elapsed().as_secs_f64(),
            comparison_table,
            scenario_results,
            ranking_summary,
            failure_report: FailureReport { total_failures, details },
        }
    }
}

impl Default for ExperimentRunner {
    fn default() -> Self {
        ExperimentRunner::with_defaults()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeData, NodeData};
    use crate::metrics::Weights;

    fn line_graph(n: u32) -> Graph {
        let mut b = Graph::builder();
        for i in 0..n {
            b = b.add_node(i, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        }
        for i in 0..n - 1 {
            b = b.add_edge(i, i + 1, EdgeData { bandwidth: 500.0, link_delay: 10.0, link_reliability: 0.99 });
        }
        b.build().unwrap()
    }

    #[test]
    fn comparison_table_means_match_recomputation_from_scenario_results() {
        let g = line_graph(5);
        let cases = vec![
            TestCase { id: "c1".into(), source: 0, destination: 4, bandwidth_requirement: 0.0, weights: Weights { delay: 1.0, reliability: 0.0, resource: 0.0 }, description: "d".into() },
        ];
        let algos = vec!["GA".to_string(), "SA".to_string()];
        let runner = ExperimentRunner::with_defaults();
        let report = runner.run(&g, &cases, &algos, 3, 42, None);

        assert_eq!(report.scenario_results.len(), 2);
        for row in &report.comparison_table {
            let matching: Vec<&ScenarioResult> = report.scenario_results.iter().filter(|s| s.algorithm == row.algorithm).collect();
            let all_costs: Vec<f64> = matching
                .iter()
                .flat_map(|s| if s.mean_cost.is_finite() { vec![s.mean_cost; 1] } else { vec![] })
                .collect();
            if !all_costs.is_empty() {
                assert!(row.overall_avg_cost.is_finite());
            }
        }
    }

    #[test]
    fn unknown_algorithm_is_skipped_without_panicking() {
        let g = line_graph(4);
        let cases = vec![TestCase { id: "c1".into(), source: 0, destination: 3, bandwidth_requirement: 0.0, weights: Weights { delay: 1.0, reliability: 0.0, resource: 0.0 }, description: "d".into() }];
        let algos = vec!["NOPE".to_string()];
        let runner = ExperimentRunner::with_defaults();
        let report = runner.run(&g, &cases, &algos, 1, 1, None);
        assert!(report.comparison_table.is_empty());
    }
}
