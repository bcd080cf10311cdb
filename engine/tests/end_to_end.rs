#![cfg(test)]

use qosroute_engine::config::{GaParams, SaParams};
use qosroute_engine::experiment::ExperimentRunner;
use qosroute_engine::graph::{EdgeData, Graph, NodeData};
use qosroute_engine::metrics::{evaluate, Weights};
use qosroute_engine::optimizers::{AntColony, GeneticAlgorithm, ParticleSwarm, QLearning, Sarsa, SimulatedAnnealing};
use qosroute_engine::result::TestCase;
use qosroute_engine::validity;
use qosroute_engine::Optimizer;

fn uniform_node(processing_delay: f64, node_reliability: f64) -> NodeData {
    NodeData { processing_delay, node_reliability }
}

fn uniform_edge(bandwidth: f64, link_delay: f64, link_reliability: f64) -> EdgeData {
    EdgeData { bandwidth, link_delay, link_reliability }
}

/// 4-node path 0-1-2-3, uniform edges (bandwidth=500, delay=10, reliability=0.99).
fn trivial_line_graph() -> Graph {
    let mut b = Graph::builder();
    for i in 0..4u32 {
        b = b.add_node(i, uniform_node(1.0, 0.99));
    }
    for i in 0..3u32 {
        b = b.add_edge(i, i + 1, uniform_edge(500.0, 10.0, 0.99));
    }
    b.build().unwrap()
}

/// Two disjoint S-D paths: A=[S,a,D] with low bandwidth, B=[S,b,D] with high bandwidth.
fn two_disjoint_paths_graph() -> Graph {
    let mut b = Graph::builder();
    for i in 0..4u32 {
        b = b.add_node(i, uniform_node(1.0, 0.99));
    }
    b = b.add_edge(0, 1, uniform_edge(200.0, 5.0, 0.99));
    b = b.add_edge(1, 3, uniform_edge(200.0, 5.0, 0.99));
    b = b.add_edge(0, 2, uniform_edge(800.0, 5.0, 0.99));
    b = b.add_edge(2, 3, uniform_edge(800.0, 5.0, 0.99));
    b.build().unwrap()
}

/// Two disjoint S-D paths: a fast-but-lossy one and a slow-but-reliable one.
fn delay_reliability_tradeoff_graph() -> Graph {
    let mut b = Graph::builder();
    for i in 0..4u32 {
        b = b.add_node(i, uniform_node(1.0, 0.99));
    }
    // fast, lossy: 0-1-3
    b = b.add_edge(0, 1, uniform_edge(500.0, 3.0, 0.80));
    b = b.add_edge(1, 3, uniform_edge(500.0, 3.0, 0.80));
    // slow, reliable: 0-2-3
    b = b.add_edge(0, 2, uniform_edge(500.0, 15.0, 0.999));
    b = b.add_edge(2, 3, uniform_edge(500.0, 15.0, 0.999));
    b.build().unwrap()
}

fn fast_ga() -> GeneticAlgorithm {
    GeneticAlgorithm::new(GaParams { max_generations: 60, stagnation_generations: 10, ..GaParams::default() })
}

fn fast_sa() -> SimulatedAnnealing {
    SimulatedAnnealing::new(SaParams { t_init: 50.0, iterations_per_temp: 5, ..SaParams::default() })
}

#[test]
fn scenario_1_trivial_line_graph_picks_the_only_path() {
    let g = trivial_line_graph();
    let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
    let result = fast_ga().optimize(&g, 0, 3, weights, 100.0, 42, None, None).unwrap();

    assert!(result.success);
    assert_eq!(result.path, vec![0, 1, 2, 3]);
    let expected_delay = 30.0 + 1.0 + 1.0; // three links @10ms + two internal nodes @1ms
    assert!((result.total_delay - expected_delay).abs() < 1e-9);
    let expected_cost = (expected_delay / 200.0).min(1.0);
    assert!((result.fitness - expected_cost).abs() < 1e-9);
}

#[test]
fn scenario_2_bandwidth_gate_forces_the_high_capacity_path() {
    let g = two_disjoint_paths_graph();
    let weights = Weights { delay: 0.0, reliability: 0.0, resource: 1.0 };
    let result = fast_ga().optimize(&g, 0, 3, weights, 500.0, 7, None, None).unwrap();

    assert!(result.success);
    assert_eq!(result.path, vec![0, 2, 3]);
    assert!(result.min_bandwidth >= 500.0);
}

#[test]
fn scenario_3_weight_shift_moves_the_chosen_path() {
    let g = delay_reliability_tradeoff_graph();

    let fast_weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
    let fast_result = fast_sa().optimize(&g, 0, 3, fast_weights, 0.0, 11, None, None).unwrap();
    assert_eq!(fast_result.path, vec![0, 1, 3]);

    let reliable_weights = Weights { delay: 0.0, reliability: 1.0, resource: 0.0 };
    let reliable_result = fast_sa().optimize(&g, 0, 3, reliable_weights, 0.0, 11, None, None).unwrap();
    assert_eq!(reliable_result.path, vec![0, 2, 3]);

    let balanced_weights = Weights { delay: 0.5, reliability: 0.5, resource: 0.0 };
    let (_, fast_cost, _) = evaluate(&g, &[0, 1, 3], balanced_weights, 0.0);
    let (_, reliable_cost, _) = evaluate(&g, &[0, 2, 3], balanced_weights, 0.0);
    let balanced_result = fast_sa().optimize(&g, 0, 3, balanced_weights, 0.0, 11, None, None).unwrap();
    let expected = if fast_cost <= reliable_cost { vec![0, 1, 3] } else { vec![0, 2, 3] };
    assert_eq!(balanced_result.path, expected);
}

#[test]
fn scenario_4_ga_is_bit_identical_across_runs_for_a_fixed_seed() {
    let g = delay_reliability_tradeoff_graph();
    let weights = Weights { delay: 0.34, reliability: 0.33, resource: 0.33 };
    let ga = fast_ga();

    let a = ga.optimize(&g, 0, 3, weights, 0.0, 42, None, None).unwrap();
    let b = ga.optimize(&g, 0, 3, weights, 0.0, 42, None, None).unwrap();

    assert_eq!(a.path, b.path);
    assert!((a.fitness - b.fitness).abs() < 1e-12);
}

#[test]
fn scenario_5_no_path_under_bandwidth_demand_from_every_optimizer() {
    let g = two_disjoint_paths_graph();
    let weights = Weights { delay: 0.34, reliability: 0.33, resource: 0.33 };
    // Exceeds both disjoint paths' capacities (200 and 800).
    let demand = 900.0;

    let ga_result = fast_ga().optimize(&g, 0, 3, weights, demand, 1, None, None).unwrap();
    let sa_result = fast_sa().optimize(&g, 0, 3, weights, demand, 1, None, None).unwrap();
    let aco_result = AntColony::default().optimize(&g, 0, 3, weights, demand, 1, None, None).unwrap();
    let pso_result = ParticleSwarm::default().optimize(&g, 0, 3, weights, demand, 1, None, None).unwrap();

    for result in [&ga_result, &sa_result, &aco_result, &pso_result] {
        assert!(!result.success);
        assert_eq!(result.failure_reason, Some(qosroute_engine::error::FailureReason::NoPath));
    }
}

#[test]
fn scenario_6_experiment_aggregation_matches_recomputed_means() {
    let g = trivial_line_graph();
    let cases = vec![
        TestCase {
            id: "case-1".into(),
            source: 0,
            destination: 3,
            bandwidth_requirement: 0.0,
            weights: Weights { delay: 1.0, reliability: 0.0, resource: 0.0 },
            description: "pure delay".into(),
        },
        TestCase {
            id: "case-2".into(),
            source: 0,
            destination: 2,
            bandwidth_requirement: 0.0,
            weights: Weights { delay: 0.0, reliability: 1.0, resource: 0.0 },
            description: "pure reliability".into(),
        },
        TestCase {
            id: "case-3".into(),
            source: 1,
            destination: 3,
            bandwidth_requirement: 0.0,
            weights: Weights { delay: 0.0, reliability: 0.0, resource: 1.0 },
            description: "pure resource".into(),
        },
    ];
    let algorithms = vec!["GA".to_string(), "SA".to_string()];

    let runner = ExperimentRunner::with_defaults();
    let report = runner.run(&g, &cases, &algorithms, 4, 99, None);

    assert_eq!(report.n_test_cases, 3);
    assert_eq!(report.n_repeats, 4);
    assert_eq!(report.scenario_results.len(), cases.len() * algorithms.len());

    for row in &report.comparison_table {
        let per_case_means: Vec<f64> = report
            .scenario_results
            .iter()
            .filter(|s| s.algorithm == row.algorithm && s.mean_cost.is_finite())
            .map(|s| s.mean_cost)
            .collect();
        if per_case_means.is_empty() {
            continue;
        }
        // overall_avg_cost is computed over every successful repeat, not the per-case means, so
        // it must fall within the min/max of those per-case means.
        let lo = per_case_means.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = per_case_means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(row.overall_avg_cost >= lo - 1e-9 && row.overall_avg_cost <= hi + 1e-9);
    }
}

#[test]
fn all_six_optimizers_find_a_valid_path_on_the_trivial_graph() {
    let g = trivial_line_graph();
    let weights = Weights { delay: 0.4, reliability: 0.3, resource: 0.3 };

    let results = vec![
        fast_ga().optimize(&g, 0, 3, weights, 0.0, 5, None, None).unwrap(),
        fast_sa().optimize(&g, 0, 3, weights, 0.0, 5, None, None).unwrap(),
        AntColony::default().optimize(&g, 0, 3, weights, 0.0, 5, None, None).unwrap(),
        ParticleSwarm::default().optimize(&g, 0, 3, weights, 0.0, 5, None, None).unwrap(),
        QLearning::default().optimize(&g, 0, 3, weights, 0.0, 5, None, None).unwrap(),
        Sarsa::default().optimize(&g, 0, 3, weights, 0.0, 5, None, None).unwrap(),
    ];

    for result in &results {
        assert!(result.success, "{:?} failed to find a path", result);
        assert!(validity::check(&g, &result.path, 0, 3, 0.0).is_ok());
        let (_, cost, _) = evaluate(&g, &result.path, weights, 0.0);
        assert!((result.fitness - cost).abs() < 1e-9);
    }
}

#[test]
fn source_equals_destination_is_reported_as_same_node() {
    let g = trivial_line_graph();
    let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
    let result = fast_ga().optimize(&g, 2, 2, weights, 0.0, 1, None, None).unwrap();
    assert!(!result.success);
    assert_eq!(result.failure_reason, Some(qosroute_engine::error::FailureReason::SameNode));
}

#[test]
fn unknown_node_is_a_fatal_error_not_a_failed_result() {
    let g = trivial_line_graph();
    let weights = Weights { delay: 1.0, reliability: 0.0, resource: 0.0 };
    let err = fast_ga().optimize(&g, 0, 999, weights, 0.0, 1, None, None).unwrap_err();
    assert!(matches!(err, qosroute_engine::Error::UnknownNode(999)));
}
