use crate::assignment::Assignment;
use crate::graph::AdjacencyGraph;
use fastrand::Rng;

/// Grows a connected set of up to `target` units from `seed` by randomized
/// breadth-first expansion. Stops early when the seed's component runs out.
pub fn grow_donor(graph: &AdjacencyGraph, seed: usize, target: usize, rng: &mut Rng) -> Vec<usize> {
    let mut in_donor = vec![false; graph.len()];
    let mut donor = Vec::with_capacity(target);
    let mut frontier = vec![seed];
    in_donor[seed] = true;

    while donor.len() < target && !frontier.is_empty() {
        let u = frontier.swap_remove(rng.usize(0..frontier.len()));
        donor.push(u);
        for &v in graph.neighbors(u) {
            if !in_donor[v] {
                in_donor[v] = true;
                frontier.push(v);
            }
        }
    }
    donor
}

/// Region-based crossover: a contiguous donor patch keeps parent A's labels,
/// everything else comes from parent B. Labels are not renumbered.
pub fn region_crossover(
    graph: &AdjacencyGraph,
    parent_a: &Assignment,
    parent_b: &Assignment,
    min_units: usize,
    max_fraction: f64,
    rng: &mut Rng,
) -> Assignment {
    let n = graph.len();
    let mut child = parent_b.clone();
    if n == 0 {
        return child;
    }

    let upper = ((max_fraction * n as f64).floor() as usize).max(min_units).min(n);
    let lower = min_units.min(upper);
    let target = rng.usize(lower..=upper);
    let seed = rng.usize(0..n);

    for u in grow_donor(graph, seed, target, rng) {
        child.set(u, parent_a.region_of(u));
    }
    child
}
