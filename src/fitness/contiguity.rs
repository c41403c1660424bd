use crate::assignment::Assignment;
use crate::graph::AdjacencyGraph;
use std::collections::VecDeque;

/// Number of connected components in the subgraph induced by `region`.
/// An empty region has zero components.
pub fn connected_components(graph: &AdjacencyGraph, assignment: &Assignment, region: u32) -> usize {
    let members: Vec<usize> = (0..assignment.len())
        .filter(|&u| assignment.region_of(u) == region)
        .collect();
    let mut seen = vec![false; assignment.len()];
    count_components(graph, assignment, &members, &mut seen)
}

/// Components per region, one traversal over the whole graph.
pub fn components_by_region(
    graph: &AdjacencyGraph,
    assignment: &Assignment,
    members: &[Vec<usize>],
) -> Vec<usize> {
    // Regions are disjoint so one visited set serves all of them.
    let mut seen = vec![false; assignment.len()];
    members
        .iter()
        .map(|m| count_components(graph, assignment, m, &mut seen))
        .collect()
}

/// `sum_r (k_r - 1)^2` over non-empty regions.
pub fn fragmentation_penalty(components: &[usize]) -> f64 {
    components
        .iter()
        .filter(|&&k| k > 0)
        .map(|&k| {
            let extra = (k - 1) as f64;
            extra * extra
        })
        .sum()
}

fn count_components(
    graph: &AdjacencyGraph,
    assignment: &Assignment,
    members: &[usize],
    seen: &mut [bool],
) -> usize {
    let mut components = 0;
    let mut queue = VecDeque::new();
    for &start in members {
        if seen[start] {
            continue;
        }
        components += 1;
        let region = assignment.region_of(start);
        seen[start] = true;
        queue.push_back(start);
        while let Some(u) = queue.pop_front() {
            for &v in graph.neighbors(u) {
                if !seen[v] && assignment.region_of(v) == region {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
    }
    components
}

/// Whether taking `unit` out of its region leaves the rest of the region with
/// no more components than before.
///
/// Removal splits the region exactly when the unit's same-region neighbours
/// stop reaching each other, so the search stops as soon as all are found.
pub fn region_is_connected_without(
    graph: &AdjacencyGraph,
    assignment: &Assignment,
    unit: usize,
) -> bool {
    let region = assignment.region_of(unit);
    let targets: Vec<usize> = graph
        .neighbors(unit)
        .iter()
        .copied()
        .filter(|&v| assignment.region_of(v) == region)
        .collect();
    if targets.len() <= 1 {
        return true;
    }

    let mut seen = vec![false; assignment.len()];
    seen[unit] = true;
    seen[targets[0]] = true;
    let mut remaining = targets.len() - 1;
    let mut queue = VecDeque::from([targets[0]]);

    while let Some(u) = queue.pop_front() {
        for &v in graph.neighbors(u) {
            if seen[v] || assignment.region_of(v) != region {
                continue;
            }
            seen[v] = true;
            if targets.contains(&v) {
                remaining -= 1;
                if remaining == 0 {
                    return true;
                }
            }
            queue.push_back(v);
        }
    }
    false
}
