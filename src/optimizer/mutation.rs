use crate::assignment::Assignment;
use crate::config::BorderWalk;
use crate::fitness::contiguity::region_is_connected_without;
use crate::graph::{AdjacencyGraph, UnitAttributes};
use fastrand::Rng;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub struct MutationParams {
    pub rate: f64,
    pub walk: BorderWalk,
    /// Skip moves that would empty or split the source region.
    pub guard: bool,
    /// Skip moves that would leave the source region below this population.
    pub min_region_population: u64,
}

/// Order in which a mutation pass visits the border units.
///
/// `Standard` shuffles the snapshot. `Bfs`/`Dfs` walk from a random border unit
/// through neighbouring border units, restarting from the next unvisited one.
/// `FollowTheLeader` also starts from the shuffled snapshot; [`border_mutation`]
/// reorders it as moves are accepted.
pub fn border_walk_order(
    graph: &AdjacencyGraph,
    border: &[usize],
    walk: BorderWalk,
    rng: &mut Rng,
) -> Vec<usize> {
    let mut pending = border.to_vec();
    rng.shuffle(&mut pending);
    if matches!(walk, BorderWalk::Standard | BorderWalk::FollowTheLeader) {
        return pending;
    }

    let mut is_border = vec![false; graph.len()];
    for &u in border {
        is_border[u] = true;
    }
    let mut visited = vec![false; graph.len()];
    let mut order = Vec::with_capacity(border.len());
    let mut work = VecDeque::new();

    for start in pending {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        work.push_back(start);
        while let Some(u) = match walk {
            BorderWalk::Dfs => work.pop_back(),
            _ => work.pop_front(),
        } {
            order.push(u);
            for &v in graph.neighbors(u) {
                if is_border[v] && !visited[v] {
                    visited[v] = true;
                    work.push_back(v);
                }
            }
        }
    }
    order
}

/// Unvisited unit of `order` outside `region` that touches it, excluding `last`.
fn next_follower(
    graph: &AdjacencyGraph,
    child: &Assignment,
    order: &[usize],
    visited: &[bool],
    region: u32,
    last: usize,
    rng: &mut Rng,
) -> Option<usize> {
    let candidates: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&v| {
            !visited[v]
                && v != last
                && child.region_of(v) != region
                && graph.neighbors(v).iter().any(|&w| child.region_of(w) == region)
        })
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.usize(0..candidates.len())])
}

/// Border-aware mutation. Returns the mutated copy and the number of moves made.
///
/// Each border unit of the input is visited once and, with probability
/// `rate`, joins the region of a random neighbour in another region.
/// Interior units are never touched.
///
/// Under `FollowTheLeader` the region that just lost a unit grows next: the
/// following visit is a unit bordering it (not the one just moved), and that
/// unit joins it. With no such unit left the pass falls back to the next
/// unvisited unit of the shuffled order.
pub fn border_mutation(
    graph: &AdjacencyGraph,
    attrs: &UnitAttributes,
    assignment: &Assignment,
    params: &MutationParams,
    rng: &mut Rng,
) -> (Assignment, usize) {
    let mut child = assignment.clone();
    if params.rate <= 0.0 {
        return (child, 0);
    }

    let border = assignment.border_units(graph);
    let order = border_walk_order(graph, &border, params.walk, rng);
    let follow = params.walk == BorderWalk::FollowTheLeader;
    let mut sizes = assignment.region_sizes();
    let mut populations = vec![0u64; sizes.len()];
    if params.min_region_population > 0 {
        for u in 0..child.len() {
            populations[child.region_of(u) as usize] += attrs.population(u);
        }
    }

    let mut visited = vec![false; graph.len()];
    let mut cursor = 0;
    // (region to grow, unit that just left it)
    let mut leader: Option<(u32, usize)> = None;
    let mut moved = 0;
    let mut foreign = Vec::new();

    loop {
        let follower = leader.and_then(|(region, last)| {
            next_follower(graph, &child, &order, &visited, region, last, rng).map(|u| (u, region))
        });
        let (u, forced) = match follower {
            Some((u, region)) => (u, Some(region)),
            None => {
                leader = None;
                while cursor < order.len() && visited[order[cursor]] {
                    cursor += 1;
                }
                match order.get(cursor) {
                    Some(&u) => (u, None),
                    None => break,
                }
            }
        };
        visited[u] = true;

        if rng.f64() >= params.rate {
            continue;
        }
        let from = child.region_of(u);
        let to = match forced {
            Some(region) => region,
            None => {
                foreign.clear();
                foreign.extend(
                    graph
                        .neighbors(u)
                        .iter()
                        .map(|&v| child.region_of(v))
                        .filter(|&r| r != from),
                );
                // Earlier moves in this pass may have absorbed every foreign neighbour.
                if foreign.is_empty() {
                    continue;
                }
                foreign[rng.usize(0..foreign.len())]
            }
        };

        if params.guard
            && (sizes[from as usize] <= 1 || !region_is_connected_without(graph, &child, u))
        {
            continue;
        }
        let pop = attrs.population(u);
        if params.min_region_population > 0
            && populations[from as usize].saturating_sub(pop) < params.min_region_population
        {
            continue;
        }

        child.set(u, to);
        sizes[from as usize] -= 1;
        sizes[to as usize] += 1;
        populations[from as usize] = populations[from as usize].saturating_sub(pop);
        populations[to as usize] += pop;
        moved += 1;
        if follow {
            leader = Some((from, u));
        }
    }
    (child, moved)
}
