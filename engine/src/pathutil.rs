//! # Path utilities
//!
//! Shared building blocks every optimizer is seeded from: a guided random walk, a small set of
//! weighted shortest-path schemes behind a process-wide LRU cache, and a bounded simple-path
//! enumerator (used both to seed the Genetic Algorithm and as the benchmark in
//! [`crate::kpaths`]).

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use rand::Rng;

use crate::graph::{EdgeData, Graph, NodeId};

/// Probability of picking the delay-guided neighbor over a uniform-random one in
/// [`guided_random_walk`] (§4.2 default).
pub const P_GUIDED: f64 = 0.7;

/// A selectable edge-weight scheme for shortest-path computations (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightScheme {
    /// Every edge costs `1` (plain hop count).
    Hops,
    /// Edge cost is `link_delay`.
    LinkDelay,
    /// Edge cost is `-ln(link_reliability)`, so summing costs multiplies reliabilities.
    NegLogReliability,
    /// Edge cost is `1 / bandwidth`.
    InvBandwidth,
}

/// `max_len` cap used by [`guided_random_walk`] and the bounded BFS inside ant/particle
/// construction: `min(|V|, 2 * avg_shortest_path_hint)`.
pub fn max_walk_len(node_count: usize, avg_shortest_path_hint: usize) -> usize {
    node_count.min(2 * avg_shortest_path_hint.max(1))
}

fn edge_weight(scheme: WeightScheme, edge: &EdgeData) -> f64 {
    match scheme {
        WeightScheme::Hops => 1.0,
        WeightScheme::LinkDelay => edge.link_delay,
        WeightScheme::NegLogReliability => -edge.link_reliability.ln(),
        WeightScheme::InvBandwidth => 1.0 / edge.bandwidth,
    }
}

/// Feasible neighbors of `u` under the bandwidth demand, excluding anything already in
/// `visited`.
pub(crate) fn feasible_neighbors(graph: &Graph, u: NodeId, bandwidth: f64, visited: &[NodeId]) -> Vec<NodeId> {
    graph
        .neighbors(u)
        .iter()
        .copied()
        .filter(|&v| !visited.contains(&v))
        .filter(|&v| {
            graph
                .edge(u, v)
                .map(|e| bandwidth <= 0.0 || e.bandwidth >= bandwidth)
                .unwrap_or(false)
        })
        .collect()
}

/// A random walk from `s` to `d`: at each step, with probability `p_guided` picks the feasible
/// neighbor weighted by `1 / (1 + link_delay)`, otherwise picks uniformly. Fails (`None`) as soon
/// as a step has no feasible neighbor, or the walk exceeds `max_len` hops.
pub fn random_walk_with_bias<R: Rng + ?Sized>(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    max_len: usize,
    p_guided: f64,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    let mut path = vec![s];
    let mut current = s;
    while current != d {
        if path.len() > max_len {
            return None;
        }
        let candidates = feasible_neighbors(graph, current, bandwidth, &path);
        if candidates.is_empty() {
            return None;
        }
        let next = if rng.gen::<f64>() < p_guided {
            let weights: Vec<f64> = candidates
                .iter()
                .map(|&v| 1.0 / (1.0 + graph.edge(current, v).unwrap().link_delay))
                .collect();
            let total: f64 = weights.iter().sum();
            let mut r = rng.gen::<f64>() * total;
            let mut chosen = candidates[candidates.len() - 1];
            for (i, &w) in weights.iter().enumerate() {
                if r < w {
                    chosen = candidates[i];
                    break;
                }
                r -= w;
            }
            chosen
        } else {
            candidates[rng.gen_range(0..candidates.len())]
        };
        path.push(next);
        current = next;
    }
    Some(path)
}

/// A guided random walk from `s` to `d` using [`P_GUIDED`] (§4.2).
pub fn guided_random_walk<R: Rng + ?Sized>(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    max_len: usize,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    random_walk_with_bias(graph, s, d, bandwidth, max_len, P_GUIDED, rng)
}

/// A uniform random walk from `s` to `d` (no delay bias), used to fill out GA population
/// diversity and as an SA/neighbor-operator fallback.
pub fn uniform_random_walk<R: Rng + ?Sized>(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    max_len: usize,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    random_walk_with_bias(graph, s, d, bandwidth, max_len, 0.0, rng)
}

/// Plain Dijkstra over `graph`, restricted to edges with `bandwidth >= demand`, using
/// `scheme` to weigh edges. Returns `None` if `d` is unreachable from `s` under that filter.
fn dijkstra(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    scheme: WeightScheme,
) -> Option<Vec<NodeId>> {
    dijkstra_avoiding(graph, s, d, bandwidth, scheme, &[])
}

/// Dijkstra that additionally treats every node in `banned` (other than `s`/`d`) as absent —
/// used by Yen's algorithm to compute spur paths.
fn dijkstra_avoiding(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    scheme: WeightScheme,
    banned: &[NodeId],
) -> Option<Vec<NodeId>> {
    #[derive(PartialEq)]
    struct HeapEntry(f64, NodeId);
    impl Eq for HeapEntry {}
    impl Ord for HeapEntry {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            other.0.partial_cmp(&self.0).unwrap_or(std::cmp::Ordering::Equal)
        }
    }
    impl PartialOrd for HeapEntry {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    let mut dist: HashMap<NodeId, f64> = HashMap::new();
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut heap = BinaryHeap::new();
    dist.insert(s, 0.0);
    heap.push(HeapEntry(0.0, s));

    while let Some(HeapEntry(d_u, u)) = heap.pop() {
        if u == d {
            break;
        }
        if d_u > *dist.get(&u).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for &v in graph.neighbors(u) {
            if banned.contains(&v) && v != d {
                continue;
            }
            let Some(edge) = graph.edge(u, v) else { continue };
            if bandwidth > 0.0 && edge.bandwidth < bandwidth {
                continue;
            }
            let alt = d_u + edge_weight(scheme, edge);
            if alt < *dist.get(&v).unwrap_or(&f64::INFINITY) {
                dist.insert(v, alt);
                prev.insert(v, u);
                heap.push(HeapEntry(alt, v));
            }
        }
    }

    if !dist.contains_key(&d) {
        return None;
    }
    let mut path = vec![d];
    let mut cur = d;
    while cur != s {
        cur = *prev.get(&cur)?;
        path.push(cur);
    }
    path.reverse();
    Some(path)
}

/// Whether `d` is reachable from `s` using only edges with `bandwidth >= demand` (`demand <= 0`
/// disables the filter). Used to short-circuit every optimizer before spending a single
/// generation/iteration/episode on a provably infeasible pair (§7 "raises NO_PATH immediately").
pub fn reachable_under_bandwidth(graph: &Graph, s: NodeId, d: NodeId, demand: f64) -> bool {
    if !graph.has_node(s) || !graph.has_node(d) {
        return false;
    }
    if s == d {
        return true;
    }
    let mut visited = vec![s];
    let mut frontier = vec![s];
    while let Some(u) = frontier.pop() {
        for &v in graph.neighbors(u) {
            if visited.contains(&v) {
                continue;
            }
            let feasible = graph
                .edge(u, v)
                .map(|e| demand <= 0.0 || e.bandwidth >= demand)
                .unwrap_or(false);
            if !feasible {
                continue;
            }
            if v == d {
                return true;
            }
            visited.push(v);
            frontier.push(v);
        }
    }
    false
}

const CACHE_CAPACITY: usize = 5000;

type CacheKey = (NodeId, NodeId, WeightScheme);

/// A tiny process-wide LRU, guarded by a mutex so concurrent cache misses never corrupt state
/// (§5, §9: "tests must cover a concurrent-miss race").
struct ShortestPathCache {
    map: HashMap<CacheKey, Vec<NodeId>>,
    order: VecDeque<CacheKey>,
}

impl ShortestPathCache {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &CacheKey) -> Option<Vec<NodeId>> {
        if let Some(path) = self.map.get(key) {
            let path = path.clone();
            self.order.retain(|k| k != key);
            self.order.push_back(*key);
            Some(path)
        } else {
            None
        }
    }

    fn insert(&mut self, key: CacheKey, path: Vec<NodeId>) {
        if !self.map.contains_key(&key) && self.map.len() >= CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.retain(|k| k != &key);
        self.order.push_back(key);
        self.map.insert(key, path);
    }
}

static SHORTEST_PATH_CACHE: Lazy<Mutex<ShortestPathCache>> =
    Lazy::new(|| Mutex::new(ShortestPathCache::new()));

/// Weighted shortest path from `s` to `d` under `scheme`, restricted to edges meeting
/// `bandwidth`. Bandwidth-restricted queries bypass the cache (the cache key is
/// `(s, d, scheme)` only, per §6); unrestricted queries (`bandwidth <= 0.0`) are cached.
pub fn cached_shortest_path(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    scheme: WeightScheme,
) -> Option<Vec<NodeId>> {
    if bandwidth > 0.0 {
        return dijkstra(graph, s, d, bandwidth, scheme);
    }
    let key = (s, d, scheme);
    {
        let mut cache = SHORTEST_PATH_CACHE.lock().unwrap();
        if let Some(hit) = cache.get(&key) {
            return Some(hit);
        }
    }
    let computed = dijkstra(graph, s, d, bandwidth, scheme)?;
    {
        let mut cache = SHORTEST_PATH_CACHE.lock().unwrap();
        cache.insert(key, computed.clone());
    }
    Some(computed)
}

fn path_weight(graph: &Graph, path: &[NodeId], scheme: WeightScheme) -> f64 {
    path.windows(2)
        .map(|w| edge_weight(scheme, graph.edge(w[0], w[1]).expect("path edges must exist")))
        .sum()
}

/// Enumerates simple paths from `s` to `d` in non-decreasing order of weight under `scheme`,
/// using Yen's algorithm, stopping once `k_max` paths have been found or no further candidate
/// exists. Paths with `min_bandwidth < bandwidth` are filtered out before counting towards
/// `k_max`. The returned order is weight-monotone and prefix-stable: truncating to any
/// `k' < k` returns the same prefix (§8 round-trip property, §9 resolved open question).
pub fn k_simple_paths(
    graph: &Graph,
    s: NodeId,
    d: NodeId,
    bandwidth: f64,
    k_max: usize,
    scheme: WeightScheme,
) -> Vec<Vec<NodeId>> {
    let mut result: Vec<Vec<NodeId>> = Vec::new();
    let Some(first) = dijkstra(graph, s, d, bandwidth, scheme) else {
        return result;
    };
    result.push(first);

    let mut candidates: Vec<(f64, Vec<NodeId>)> = Vec::new();

    while result.len() < k_max {
        let prev_path = result.last().unwrap().clone();
        for i in 0..prev_path.len() - 1 {
            let spur_node = prev_path[i];
            let root_path = &prev_path[..=i];

            let mut banned_nodes: Vec<NodeId> = root_path[..root_path.len() - 1].to_vec();
            // Ban edges leaving spur_node that are used by any already-found path sharing the
            // same root.
            let mut banned_edge_targets: Vec<NodeId> = Vec::new();
            for p in result.iter() {
                if p.len() > i && p[..=i] == root_path[..] {
                    banned_edge_targets.push(p[i + 1]);
                }
            }

            // Temporarily treat spur_node's banned-edge targets as unreachable by pretending
            // they are banned nodes too, unless that target is the destination itself.
            for t in &banned_edge_targets {
                if *t != d {
                    banned_nodes.push(*t);
                }
            }

            if let Some(spur_path) =
                dijkstra_avoiding(graph, spur_node, d, bandwidth, scheme, &banned_nodes)
            {
                if spur_path.len() >= 2 || spur_node == d {
                    let mut total_path = root_path[..root_path.len() - 1].to_vec();
                    total_path.extend(spur_path);
                    if crate::validity::is_simple(&total_path)
                        && !result.contains(&total_path)
                        && !candidates.iter().any(|(_, p)| p == &total_path)
                    {
                        let w = path_weight(graph, &total_path, scheme);
                        candidates.push((w, total_path));
                    }
                }
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let (_, next) = candidates.remove(0);
        result.push(next);
    }

    result
        .into_iter()
        .filter(|p| {
            bandwidth <= 0.0
                || p.windows(2)
                    .all(|w| graph.edge(w[0], w[1]).map(|e| e.bandwidth >= bandwidth).unwrap_or(false))
        })
        .take(k_max)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeData, NodeData};

    fn line_graph(n: u32) -> Graph {
        let mut b = Graph::builder();
        for i in 0..n {
            b = b.add_node(
                i,
                NodeData {
                    processing_delay: 1.0,
                    node_reliability: 0.99,
                },
            );
        }
        for i in 0..n - 1 {
            b = b.add_edge(
                i,
                i + 1,
                EdgeData {
                    bandwidth: 500.0,
                    link_delay: 10.0,
                    link_reliability: 0.99,
                },
            );
        }
        b.build().unwrap()
    }

    #[test]
    fn shortest_path_on_line_graph() {
        let g = line_graph(5);
        let p = cached_shortest_path(&g, 0, 4, 0.0, WeightScheme::Hops).unwrap();
        assert_eq!(p, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn k_simple_paths_is_monotone_and_prefix_stable() {
        let g = line_graph(4);
        let k5 = k_simple_paths(&g, 0, 3, 0.0, 5, WeightScheme::Hops);
        let k2 = k_simple_paths(&g, 0, 3, 0.0, 2, WeightScheme::Hops);
        assert_eq!(k2.as_slice(), &k5[..k2.len().min(k5.len())]);
    }

    #[test]
    fn reachable_under_bandwidth_respects_filter() {
        let g = line_graph(4);
        assert!(reachable_under_bandwidth(&g, 0, 3, 0.0));
        assert!(reachable_under_bandwidth(&g, 0, 3, 500.0));
        assert!(!reachable_under_bandwidth(&g, 0, 3, 600.0));
    }

    #[test]
    fn guided_walk_fails_on_isolated_destination() {
        let mut b = Graph::builder();
        b = b.add_node(0, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        b = b.add_node(1, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        let g = b.build().unwrap();
        let mut rng = crate::rng::rng_from_seed(1);
        assert!(guided_random_walk(&g, 0, 1, 0.0, 10, &mut rng).is_none());
    }
}
