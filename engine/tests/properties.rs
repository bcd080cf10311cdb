#![cfg(test)]

use qosroute_engine::experiment::ExperimentRunner;
use qosroute_engine::graph::{EdgeData, Graph, NodeData};
use qosroute_engine::metrics::{dominates, evaluate, weighted_cost, PathMetrics, Weights};
use qosroute_engine::report::{from_json_str, to_json_string};
use qosroute_engine::result::TestCase;
use qosroute_engine::validity::{check, Violation};

fn two_path_graph() -> Graph {
    let mut b = Graph::builder();
    for i in 0..4u32 {
        b = b.add_node(i, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
    }
    b = b.add_edge(0, 1, EdgeData { bandwidth: 200.0, link_delay: 20.0, link_reliability: 0.95 });
    b = b.add_edge(1, 3, EdgeData { bandwidth: 200.0, link_delay: 20.0, link_reliability: 0.95 });
    b = b.add_edge(0, 2, EdgeData { bandwidth: 800.0, link_delay: 5.0, link_reliability: 0.999 });
    b = b.add_edge(2, 3, EdgeData { bandwidth: 800.0, link_delay: 5.0, link_reliability: 0.999 });
    b.build().unwrap()
}

fn sample_weights() -> Vec<Weights> {
    vec![
        Weights { delay: 1.0, reliability: 0.0, resource: 0.0 },
        Weights { delay: 0.0, reliability: 1.0, resource: 0.0 },
        Weights { delay: 0.0, reliability: 0.0, resource: 1.0 },
        Weights { delay: 0.34, reliability: 0.33, resource: 0.33 },
        Weights { delay: 0.6, reliability: 0.1, resource: 0.3 },
        Weights { delay: 0.1, reliability: 0.6, resource: 0.3 },
    ]
}

/// §8 invariant 4: dominance implies lower-or-equal weighted cost for every non-negative,
/// sum-to-one weight vector.
#[test]
fn dominance_implies_weighted_cost_monotonicity_across_weight_vectors() {
    let g = two_path_graph();
    let (metrics_a, _, _) = evaluate(&g, &[0, 2, 3], Weights { delay: 1.0, reliability: 0.0, resource: 0.0 }, 0.0);
    let (metrics_b, _, _) = evaluate(&g, &[0, 1, 3], Weights { delay: 1.0, reliability: 0.0, resource: 0.0 }, 0.0);

    assert!(dominates(&metrics_a, &metrics_b), "path a should dominate path b in this fixture");

    for w in sample_weights() {
        let cost_a = weighted_cost(&metrics_a, w, 0.0);
        let cost_b = weighted_cost(&metrics_b, w, 0.0);
        assert!(cost_a <= cost_b + 1e-12, "dominance violated for weights {w:?}: {cost_a} > {cost_b}");
    }
}

#[test]
fn dominance_is_irreflexive() {
    let metrics = PathMetrics { total_delay: 10.0, total_reliability: 0.9, resource_cost: 2.0, min_bandwidth: 500.0, hops: 3 };
    assert!(!dominates(&metrics, &metrics));
}

/// §8 round-trip property, exercised against a real experiment run rather than a hand-written
/// literal.
#[test]
fn experiment_report_round_trips_through_json_end_to_end() {
    let g = two_path_graph();
    let cases = vec![TestCase {
        id: "c1".into(),
        source: 0,
        destination: 3,
        bandwidth_requirement: 0.0,
        weights: Weights { delay: 0.5, reliability: 0.5, resource: 0.0 },
        description: "roundtrip fixture".into(),
    }];
    let report = ExperimentRunner::with_defaults().run(&g, &cases, &["GA".to_string()], 2, 3, None);

    let json = to_json_string(&report).unwrap();
    let parsed = from_json_str(&json).unwrap();
    assert_eq!(report, parsed);
}

/// §8 property 6: the validity checker rejects every documented violation class.
#[test]
fn validity_checker_rejects_every_violation_class() {
    let g = two_path_graph();

    assert_eq!(check(&g, &[0], 0, 3, 0.0), Err(Violation::TooShort));
    assert_eq!(check(&g, &[1, 0, 2, 3], 0, 3, 0.0), Err(Violation::WrongSource));
    assert_eq!(check(&g, &[0, 2, 1], 0, 3, 0.0), Err(Violation::WrongDestination));
    assert_eq!(check(&g, &[0, 2, 3, 2], 0, 2, 0.0), Err(Violation::RepeatedNode(2)));
    assert_eq!(check(&g, &[0, 1, 0, 1, 3], 0, 3, 0.0), Err(Violation::RepeatedNode(0)));
    assert_eq!(check(&g, &[0, 3], 0, 3, 0.0), Err(Violation::MissingEdge(0, 3)));
    assert_eq!(check(&g, &[0, 1, 3], 0, 3, 500.0), Err(Violation::BandwidthInsufficient));
    assert_eq!(check(&g, &[0, 2, 3], 0, 3, 500.0), Ok(()));
}

/// §8 boundary behavior: B=0 disables the bandwidth constraint, every optimizer still returns a
/// simple path.
#[test]
fn zero_bandwidth_demand_disables_the_constraint() {
    let g = two_path_graph();
    let (metrics, cost, failure) = evaluate(&g, &[0, 1, 3], Weights { delay: 1.0, reliability: 0.0, resource: 0.0 }, 0.0);
    assert!(failure.is_none());
    assert!(cost.is_finite());
    assert!(metrics.min_bandwidth < 500.0); // would fail a real demand, but none was set
}
