use crate::assignment::Assignment;
use crate::consts::UNASSIGNED;
use crate::graph::AdjacencyGraph;
use fastrand::Rng;

/// Random contiguous-ish plan: `region_count` distinct seed units, then each
/// step extends a random frontier unit into one of its unclaimed neighbours.
///
/// Components of the graph that received no seed are claimed by a random
/// region and grown the same way, so every unit ends up assigned.
pub fn grow_random_assignment(graph: &AdjacencyGraph, region_count: u32, rng: &mut Rng) -> Assignment {
    let n = graph.len();
    let mut labels = vec![UNASSIGNED; n];
    let mut order: Vec<usize> = (0..n).collect();
    rng.shuffle(&mut order);

    let mut frontier = Vec::with_capacity(n);
    for (r, &u) in order.iter().take(region_count as usize).enumerate() {
        labels[u] = r as u32;
        frontier.push(u);
    }

    let mut next_orphan = 0;
    let mut open = Vec::new();
    loop {
        while !frontier.is_empty() {
            let i = rng.usize(0..frontier.len());
            let u = frontier[i];
            open.clear();
            open.extend(
                graph
                    .neighbors(u)
                    .iter()
                    .copied()
                    .filter(|&v| labels[v] == UNASSIGNED),
            );
            if open.is_empty() {
                frontier.swap_remove(i);
                continue;
            }
            let v = open[rng.usize(0..open.len())];
            labels[v] = labels[u];
            frontier.push(v);
        }

        while next_orphan < n && labels[order[next_orphan]] != UNASSIGNED {
            next_orphan += 1;
        }
        if next_orphan == n {
            break;
        }
        let orphan = order[next_orphan];
        labels[orphan] = rng.u32(0..region_count);
        frontier.push(orphan);
    }

    Assignment::from_labels(labels, region_count)
}
