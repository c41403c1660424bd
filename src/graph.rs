use crate::error::{BfResult, BorderForgeError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One geographic unit as it arrives from a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub population: u64,
    pub lean: f64,
}

/// Symmetric unit adjacency over dense indices `0..len()`.
///
/// External ids are kept only for lookups and output. Every algorithm in
/// the crate works on the dense index.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    neighbors: Vec<Vec<usize>>,
}

impl AdjacencyGraph {
    /// Builds the graph from id pairs. Unknown ids are a data integrity error,
    /// one-directional edges are mirrored and self-loops are dropped.
    pub fn from_edges<I, S>(ids: Vec<String>, edges: I) -> BfResult<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let index = build_index(&ids)?;
        let mut pairs = Vec::new();
        for (a, b) in edges {
            let (a, b) = (a.as_ref(), b.as_ref());
            let ia = *index.get(a).ok_or_else(|| unknown_unit(a, b))?;
            let ib = *index.get(b).ok_or_else(|| unknown_unit(b, a))?;
            pairs.push((ia, ib));
        }
        Ok(Self::assemble(ids, index, pairs))
    }

    /// Same as [`from_edges`](Self::from_edges) for callers that already work
    /// with dense indices (synthetic generators, tests).
    pub fn from_index_edges<I>(ids: Vec<String>, edges: I) -> BfResult<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let index = build_index(&ids)?;
        let n = ids.len();
        let mut pairs = Vec::new();
        for (a, b) in edges {
            if a >= n || b >= n {
                return Err(BorderForgeError::DataIntegrity(format!(
                    "Edge ({}, {}) references a unit index outside 0..{}",
                    a, b, n
                )));
            }
            pairs.push((a, b));
        }
        Ok(Self::assemble(ids, index, pairs))
    }

    fn assemble(ids: Vec<String>, index: HashMap<String, usize>, pairs: Vec<(usize, usize)>) -> Self {
        let mut neighbors = vec![Vec::new(); ids.len()];
        for (a, b) in pairs {
            if a == b {
                continue;
            }
            neighbors[a].push(b);
            neighbors[b].push(a);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Self {
            ids,
            index,
            neighbors,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline(always)]
    pub fn neighbors(&self, unit: usize) -> &[usize] {
        &self.neighbors[unit]
    }

    pub fn id(&self, unit: usize) -> &str {
        &self.ids[unit]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Connected components of the whole graph, each as a list of unit indices.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.len()];
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..self.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            queue.push_back(start);
            let mut comp = Vec::new();
            while let Some(u) = queue.pop_front() {
                comp.push(u);
                for &v in &self.neighbors[u] {
                    if !seen[v] {
                        seen[v] = true;
                        queue.push_back(v);
                    }
                }
            }
            out.push(comp);
        }
        out
    }
}

fn build_index(ids: &[String]) -> BfResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(BorderForgeError::DataIntegrity(format!(
                "Duplicate unit id '{}'",
                id
            )));
        }
    }
    Ok(index)
}

fn unknown_unit(missing: &str, other: &str) -> BorderForgeError {
    BorderForgeError::DataIntegrity(format!(
        "Adjacency edge {} <-> {} names unknown unit '{}'",
        other, missing, missing
    ))
}

/// Static per-unit data, indexed like the [`AdjacencyGraph`].
#[derive(Debug, Clone)]
pub struct UnitAttributes {
    population: Vec<u64>,
    lean: Vec<f64>,
    total_population: u64,
}

impl UnitAttributes {
    pub fn new(population: Vec<u64>, lean: Vec<f64>) -> BfResult<Self> {
        if population.len() != lean.len() {
            return Err(BorderForgeError::DataIntegrity(format!(
                "{} populations but {} leans",
                population.len(),
                lean.len()
            )));
        }
        if let Some((i, l)) = lean
            .iter()
            .enumerate()
            .find(|(_, l)| !l.is_finite() || !(-1.0..=1.0).contains(*l))
        {
            return Err(BorderForgeError::DataIntegrity(format!(
                "Unit #{} has lean {} outside [-1, 1]",
                i, l
            )));
        }
        let total_population = population.iter().sum();
        Ok(Self {
            population,
            lean,
            total_population,
        })
    }

    /// Splits unit records into attributes ordered like `graph`.
    pub fn from_units(graph: &AdjacencyGraph, units: &[Unit]) -> BfResult<Self> {
        let mut population = vec![None; graph.len()];
        let mut lean = vec![0.0; graph.len()];
        for u in units {
            let i = graph.index_of(&u.id).ok_or_else(|| {
                BorderForgeError::DataIntegrity(format!(
                    "Unit '{}' has attributes but no adjacency entry",
                    u.id
                ))
            })?;
            if population[i].replace(u.population).is_some() {
                return Err(BorderForgeError::DataIntegrity(format!(
                    "Duplicate unit id '{}'",
                    u.id
                )));
            }
            lean[i] = u.lean;
        }
        let population = population
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                p.ok_or_else(|| {
                    BorderForgeError::DataIntegrity(format!(
                        "Unit '{}' appears in the adjacency but has no attributes",
                        graph.id(i)
                    ))
                })
            })
            .collect::<BfResult<Vec<_>>>()?;
        Self::new(population, lean)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.population.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    #[inline(always)]
    pub fn population(&self, unit: usize) -> u64 {
        self.population[unit]
    }

    #[inline(always)]
    pub fn lean(&self, unit: usize) -> f64 {
        self.lean[unit]
    }

    pub fn total_population(&self) -> u64 {
        self.total_population
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("u{}", i)).collect()
    }

    #[test]
    fn test_edges_are_symmetric_and_deduplicated() {
        let g = AdjacencyGraph::from_edges(
            ids(3),
            vec![("u0", "u1"), ("u1", "u0"), ("u1", "u2"), ("u2", "u2")],
        )
        .unwrap();

        assert_eq!(g.neighbors(0), &[1]);
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert_eq!(g.neighbors(2), &[1], "Self-loop should be dropped");
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_unknown_neighbor_is_integrity_error() {
        let err = AdjacencyGraph::from_edges(ids(2), vec![("u0", "ghost")]).unwrap_err();
        assert!(matches!(err, BorderForgeError::DataIntegrity(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dup = vec!["a".to_string(), "a".to_string()];
        let err = AdjacencyGraph::from_index_edges(dup, Vec::new()).unwrap_err();
        assert!(matches!(err, BorderForgeError::DataIntegrity(_)));
    }

    #[test]
    fn test_lean_out_of_range() {
        let err = UnitAttributes::new(vec![1, 1], vec![0.5, 1.5]).unwrap_err();
        assert!(matches!(err, BorderForgeError::DataIntegrity(_)));
        assert!(UnitAttributes::new(vec![1], vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_components_of_disconnected_graph() {
        let g = AdjacencyGraph::from_index_edges(ids(5), vec![(0, 1), (3, 4)]).unwrap();
        let comps = g.components();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[1], vec![2]);
    }

    #[test]
    fn test_units_missing_attributes() {
        let g = AdjacencyGraph::from_index_edges(ids(2), vec![(0, 1)]).unwrap();
        let units = vec![Unit {
            id: "u0".into(),
            population: 10,
            lean: 0.0,
        }];
        let err = UnitAttributes::from_units(&g, &units).unwrap_err();
        assert!(err.to_string().contains("u1"));
    }
}
