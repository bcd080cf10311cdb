//! Shared tabular temporal-difference scaffolding for Q-Learning (§4.7) and SARSA (§4.8). The
//! two algorithms share everything but the backup target: Q-Learning bootstraps off the greedy
//! max over the next state's actions (off-policy), SARSA bootstraps off the actually-selected
//! next action under the same epsilon-greedy behavior policy (on-policy). `Variant` picks which.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;

use crate::config::TdLearningParams;
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use crate::metrics::{evaluate, Weights};
use crate::result::{OptResult, Seed};
use crate::rng::rng_from_seed;

use super::{common_precheck, finish_success, report_progress, CancelFlag, Progress, ProgressCallback};

/// Which backup target to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Off-policy: target is `max_a' Q(s', a')`.
    QLearning,
    /// On-policy: target is `Q(s', a')` for the action actually selected next.
    Sarsa,
}

type StateAction = (NodeId, NodeId);

fn allowed_actions(graph: &Graph, node: NodeId, bandwidth: f64, visited: &[NodeId]) -> Vec<NodeId> {
    graph
        .neighbors(node)
        .iter()
        .copied()
        .filter(|v| !visited.contains(v))
        .filter(|&v| {
            graph
                .edge(node, v)
                .map(|e| bandwidth <= 0.0 || e.bandwidth >= bandwidth)
                .unwrap_or(false)
        })
        .collect()
}

/// Per-edge reward contribution, reusing the metric kernel's normalization scale (§4.1) so the
/// learned policy optimizes the same objective the experiment runner measures.
fn edge_reward(graph: &Graph, u: NodeId, v: NodeId, weights: Weights) -> f64 {
    let Some(edge) = graph.edge(u, v) else {
        return -1.0;
    };
    let norm_delay = (edge.link_delay / 200.0).min(1.0);
    let norm_rel = ((1.0 - edge.link_reliability) * 10.0).min(1.0);
    let norm_res = (1.0_f64 / 20.0).min(1.0);
    -(weights.delay * norm_delay + weights.reliability * norm_rel + weights.resource * norm_res)
}

fn epsilon_greedy_action(q: &HashMap<StateAction, f64>, state: NodeId, allowed: &[NodeId], epsilon: f64, rng: &mut impl Rng) -> NodeId {
    if rng.gen::<f64>() < epsilon {
        return allowed[rng.gen_range(0..allowed.len())];
    }
    let mut best = allowed[0];
    let mut best_q = *q.get(&(state, best)).unwrap_or(&0.0);
    for &a in &allowed[1..] {
        let qa = *q.get(&(state, a)).unwrap_or(&0.0);
        if qa > best_q {
            best_q = qa;
            best = a;
        }
    }
    best
}

/// Runs the shared training loop and extracts the final path (greedy rollout, falling back to
/// the best episode observed if the greedy policy dead-ends or cycles).
#[allow(clippy::too_many_arguments)]
pub fn run(
    variant: Variant,
    params: &TdLearningParams,
    graph: &Graph,
    source: NodeId,
    destination: NodeId,
    weights: Weights,
    bandwidth_demand: f64,
    seed: Seed,
    mut progress_cb: Option<&mut ProgressCallback>,
    cancel: Option<&CancelFlag>,
) -> Result<OptResult, Error> {
    let start = Instant::now();
    if let Some(result) = common_precheck(graph, source, destination, weights, bandwidth_demand, seed, start)? {
        return Ok(result);
    }

    let mut rng = rng_from_seed(seed);
    let mut q: HashMap<StateAction, f64> = HashMap::new();
    let max_len = params.max_episode_len(graph.node_count());

    let mut best_episode_path: Option<Vec<NodeId>> = None;
    let mut best_episode_cost = f64::INFINITY;
    let mut best_episode_index: u64 = 0;

    let mut epsilon = params.epsilon_init;

    for episode in 0..params.episodes {
        if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
            break;
        }

        let mut path = vec![source];
        let mut current = source;
        let mut allowed = allowed_actions(graph, current, bandwidth_demand, &path);
        let mut action = if allowed.is_empty() { None } else { Some(epsilon_greedy_action(&q, current, &allowed, epsilon, &mut rng)) };

        for _ in 0..max_len {
            let Some(a) = action else { break };
            let reward = edge_reward(graph, current, a, weights) + if a == destination { params.goal_reward } else { 0.0 };
            path.push(a);

            if a == destination {
                let entry = q.entry((current, a)).or_insert(0.0);
                *entry += params.learning_rate * (reward - *entry);
                break;
            }

            let next_allowed = allowed_actions(graph, a, bandwidth_demand, &path);
            if next_allowed.is_empty() {
                let entry = q.entry((current, a)).or_insert(0.0);
                *entry += params.learning_rate * (params.dead_end_penalty - *entry);
                break;
            }

            let next_action = epsilon_greedy_action(&q, a, &next_allowed, epsilon, &mut rng);
            let target = match variant {
                Variant::QLearning => next_allowed.iter().map(|&a2| *q.get(&(a, a2)).unwrap_or(&0.0)).fold(f64::NEG_INFINITY, f64::max),
                Variant::Sarsa => *q.get(&(a, next_action)).unwrap_or(&0.0),
            };
            let entry = q.entry((current, a)).or_insert(0.0);
            *entry += params.learning_rate * (reward + params.discount * target - *entry);

            current = a;
            allowed = next_allowed;
            action = Some(next_action);
        }

        if *path.last().unwrap() == destination {
            let (_, cost, _) = evaluate(graph, &path, weights, bandwidth_demand);
            if cost < best_episode_cost {
                best_episode_cost = cost;
                best_episode_path = Some(path);
                best_episode_index = episode;
            }
        }

        epsilon = (epsilon * params.epsilon_decay).max(params.epsilon_min);
        report_progress(&mut progress_cb, Progress { step: episode, best_cost: best_episode_cost });
    }

    let greedy = greedy_rollout(graph, &q, source, destination, bandwidth_demand, max_len);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match greedy {
        Some(path) => Ok(finish_success(graph, path, weights, bandwidth_demand, seed, elapsed_ms, params.episodes)),
        None => match best_episode_path {
            Some(path) => Ok(finish_success(graph, path, weights, bandwidth_demand, seed, elapsed_ms, best_episode_index)),
            None => Ok(OptResult::failure(crate::error::FailureReason::NoPath, seed, elapsed_ms)),
        },
    }
}

fn greedy_rollout(graph: &Graph, q: &HashMap<StateAction, f64>, source: NodeId, destination: NodeId, bandwidth_demand: f64, max_len: usize) -> Option<Vec<NodeId>> {
    let mut path = vec![source];
    let mut current = source;
    while current != destination {
        if path.len() > max_len {
            return None;
        }
        let allowed = allowed_actions(graph, current, bandwidth_demand, &path);
        if allowed.is_empty() {
            return None;
        }
        let mut best = allowed[0];
        let mut best_q = *q.get(&(current, best)).unwrap_or(&f64::NEG_INFINITY);
        for &a in &allowed[1..] {
            let qa = *q.get(&(current, a)).unwrap_or(&f64::NEG_INFINITY);
            if qa > best_q {
                best_q = qa;
                best = a;
            }
        }
        path.push(best);
        current = best;
    }
    Some(path)
}
