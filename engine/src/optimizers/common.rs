//! Structural path operators shared by the population/trajectory-based optimizers (GA, SA): the
//! "common internal node" crossover point search, the three diversity-tiered mutation operators,
//! and population diversity itself. Grounded in the same "small composable operator" shape the
//! grounding stack's modifier/permutator traits use, but these are free functions rather than
//! trait objects since there's no need for dynamic dispatch among them.

use rand::Rng;
use std::collections::HashSet;

use crate::graph::{Graph, NodeId};
use crate::pathutil::{feasible_neighbors, uniform_random_walk};
use crate::validity::is_simple;

/// Internal nodes (excluding both endpoints) present in both `a` and `b`, in the order they
/// appear in `a`. Used as candidate crossover/splice points.
pub fn common_internal_nodes(a: &[NodeId], b: &[NodeId]) -> Vec<NodeId> {
    if a.len() < 2 || b.len() < 2 {
        return Vec::new();
    }
    let b_internal: HashSet<NodeId> = b[1..b.len() - 1].iter().copied().collect();
    a[1..a.len() - 1]
        .iter()
        .copied()
        .filter(|n| b_internal.contains(n))
        .collect()
}

/// Edge-based crossover (§4.3): splice `a` and `b` at a shared internal node `c`, producing
/// `a[..c] ++ b[c..]`. Returns `None` if the result is not a simple path.
pub fn splice_at(a: &[NodeId], b: &[NodeId], c: NodeId) -> Option<Vec<NodeId>> {
    let ia = a.iter().position(|&n| n == c)?;
    let ib = b.iter().position(|&n| n == c)?;
    let mut child = a[..ia].to_vec();
    child.extend_from_slice(&b[ib..]);
    if is_simple(&child) {
        Some(child)
    } else {
        None
    }
}

/// Jaccard-distance-based diversity of a population: `1 - average Jaccard similarity` over a
/// random sample of `n_pairs` pairs (§4.3). Each path is compared as its node set.
pub fn population_diversity<R: Rng + ?Sized>(population: &[Vec<NodeId>], n_pairs: usize, rng: &mut R) -> f64 {
    if population.len() < 2 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut count = 0;
    for _ in 0..n_pairs {
        let i = rng.gen_range(0..population.len());
        let j = rng.gen_range(0..population.len());
        if i == j {
            continue;
        }
        let a: HashSet<NodeId> = population[i].iter().copied().collect();
        let b: HashSet<NodeId> = population[j].iter().copied().collect();
        let inter = a.intersection(&b).count();
        let union = a.union(&b).count();
        let similarity = if union == 0 { 1.0 } else { inter as f64 / union as f64 };
        total += similarity;
        count += 1;
    }
    if count == 0 {
        return 1.0;
    }
    1.0 - (total / count as f64)
}

/// Segment-replacement mutation (§4.3): pick `i < j` in `path`, replace `path[i..=j]` with a
/// fresh uniform walk from `path[i]` to `path[j]` respecting `bandwidth`. `None` if no walk
/// exists or the path is too short to pick two distinct indices.
pub fn segment_replacement<R: Rng + ?Sized>(
    graph: &Graph,
    path: &[NodeId],
    bandwidth: f64,
    max_len: usize,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    if path.len() < 3 {
        return None;
    }
    let i = rng.gen_range(0..path.len() - 1);
    let j = rng.gen_range(i + 1..path.len());
    let segment = uniform_random_walk(graph, path[i], path[j], bandwidth, max_len, rng)?;
    let mut child = path[..i].to_vec();
    child.extend(segment);
    child.extend_from_slice(&path[j + 1..]);
    if is_simple(&child) {
        Some(child)
    } else {
        None
    }
}

/// Node-insertion mutation (§4.3): pick adjacent `i, i+1`, insert a common feasible neighbor of
/// `path[i]` and `path[i+1]` between them. `None` if none exists.
pub fn node_insertion<R: Rng + ?Sized>(
    graph: &Graph,
    path: &[NodeId],
    bandwidth: f64,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    if path.len() < 2 {
        return None;
    }
    let i = rng.gen_range(0..path.len() - 1);
    let a = feasible_neighbors(graph, path[i], bandwidth, path);
    let b = feasible_neighbors(graph, path[i + 1], bandwidth, path);
    let b_set: HashSet<NodeId> = b.into_iter().collect();
    let candidates: Vec<NodeId> = a.into_iter().filter(|n| b_set.contains(n)).collect();
    if candidates.is_empty() {
        return None;
    }
    let chosen = candidates[rng.gen_range(0..candidates.len())];
    let mut child = path[..=i].to_vec();
    child.push(chosen);
    child.extend_from_slice(&path[i + 1..]);
    if is_simple(&child) {
        Some(child)
    } else {
        None
    }
}

/// Node-replacement mutation (§4.3, and the SA neighbor operator of §4.6): pick an internal node
/// `path[i]`, replace it with a common feasible neighbor of `path[i-1]` and `path[i+1]` distinct
/// from `path[i]`. `None` if none exists.
pub fn node_replacement<R: Rng + ?Sized>(
    graph: &Graph,
    path: &[NodeId],
    bandwidth: f64,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    if path.len() < 3 {
        return None;
    }
    let i = rng.gen_range(1..path.len() - 1);
    let a = feasible_neighbors(graph, path[i - 1], bandwidth, &[]);
    let b = feasible_neighbors(graph, path[i + 1], bandwidth, &[]);
    let b_set: HashSet<NodeId> = b.into_iter().collect();
    let candidates: Vec<NodeId> = a
        .into_iter()
        .filter(|n| b_set.contains(n) && *n != path[i])
        .filter(|n| !path.contains(n))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let chosen = candidates[rng.gen_range(0..candidates.len())];
    let mut child = path.to_vec();
    child[i] = chosen;
    if is_simple(&child) {
        Some(child)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeData, NodeData};
    use crate::rng::rng_from_seed;

    fn grid() -> Graph {
        // 0-1-2
        // | | |
        // 3-4-5
        let mut b = Graph::builder();
        for i in 0..6u32 {
            b = b.add_node(i, NodeData { processing_delay: 1.0, node_reliability: 0.99 });
        }
        let e = EdgeData { bandwidth: 500.0, link_delay: 5.0, link_reliability: 0.99 };
        for (u, v) in [(0, 1), (1, 2), (3, 4), (4, 5), (0, 3), (1, 4), (2, 5)] {
            b = b.add_edge(u, v, e);
        }
        b.build().unwrap()
    }

    #[test]
    fn common_internal_nodes_excludes_endpoints() {
        let a = vec![0, 1, 4, 5];
        let b = vec![3, 4, 1, 2];
        let common = common_internal_nodes(&a, &b);
        assert_eq!(common, vec![1, 4]);
    }

    #[test]
    fn splice_produces_simple_path_or_none() {
        let a = vec![0, 1, 4, 5];
        let b = vec![3, 4, 1, 2];
        let child = splice_at(&a, &b, 1);
        assert!(child.is_none() || is_simple(&child.unwrap()));
    }

    #[test]
    fn node_replacement_keeps_endpoints() {
        let g = grid();
        let mut rng = rng_from_seed(7);
        let path = vec![0, 1, 2, 5];
        if let Some(child) = node_replacement(&g, &path, 0.0, &mut rng) {
            assert_eq!(child[0], 0);
            assert_eq!(*child.last().unwrap(), 5);
        }
    }

    #[test]
    fn diversity_is_zero_for_identical_population() {
        let pop = vec![vec![0, 1, 2], vec![0, 1, 2], vec![0, 1, 2]];
        let mut rng = rng_from_seed(1);
        let d = population_diversity(&pop, 20, &mut rng);
        assert!(d.abs() < 1e-9);
    }
}
