use crate::error::{BfResult, BorderForgeError};
use crate::fitness::outcome::WeightScheme;
use crate::graph::{AdjacencyGraph, UnitAttributes};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The chromosome: one region label in `0..region_count` per unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Assignment {
    regions: Vec<u32>,
    region_count: u32,
}

impl Assignment {
    pub fn new(regions: Vec<u32>, region_count: u32) -> BfResult<Self> {
        if let Some((unit, r)) = regions
            .iter()
            .enumerate()
            .find(|(_, &r)| r >= region_count)
        {
            return Err(BorderForgeError::DataIntegrity(format!(
                "Unit #{} is assigned to region {} but only {} regions exist",
                unit, r, region_count
            )));
        }
        Ok(Self {
            regions,
            region_count,
        })
    }

    /// Builds from labels the caller guarantees are in range.
    pub(crate) fn from_labels(regions: Vec<u32>, region_count: u32) -> Self {
        debug_assert!(regions.iter().all(|&r| r < region_count));
        Self {
            regions,
            region_count,
        }
    }

    /// Resolves an `id -> region` map against the graph. Every unit must be present.
    pub fn from_map(
        graph: &AdjacencyGraph,
        map: &HashMap<String, u32>,
        region_count: u32,
    ) -> BfResult<Self> {
        let mut regions = Vec::with_capacity(graph.len());
        for id in graph.ids() {
            let r = map.get(id).ok_or_else(|| {
                BorderForgeError::DataIntegrity(format!(
                    "Reference assignment has no region for unit '{}'",
                    id
                ))
            })?;
            regions.push(*r);
        }
        if let Some(extra) = map.keys().find(|id| graph.index_of(id).is_none()) {
            return Err(BorderForgeError::DataIntegrity(format!(
                "Reference assignment names unknown unit '{}'",
                extra
            )));
        }
        Self::new(regions, region_count)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[inline(always)]
    pub fn region_of(&self, unit: usize) -> u32 {
        self.regions[unit]
    }

    #[inline]
    pub fn region_count(&self) -> u32 {
        self.region_count
    }

    pub fn labels(&self) -> &[u32] {
        &self.regions
    }

    /// Only the genetic operators relabel units, always on a private copy.
    #[inline(always)]
    pub(crate) fn set(&mut self, unit: usize, region: u32) {
        debug_assert!(region < self.region_count);
        self.regions[unit] = region;
    }

    /// Unit indices grouped by region, in ascending unit order.
    pub fn members_by_region(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.region_count as usize];
        for (unit, &r) in self.regions.iter().enumerate() {
            members[r as usize].push(unit);
        }
        members
    }

    pub fn region_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.region_count as usize];
        for &r in &self.regions {
            sizes[r as usize] += 1;
        }
        sizes
    }

    /// A unit with at least one neighbour in another region.
    #[inline]
    pub fn is_border(&self, graph: &AdjacencyGraph, unit: usize) -> bool {
        let r = self.regions[unit];
        graph.neighbors(unit).iter().any(|&v| self.regions[v] != r)
    }

    pub fn border_units(&self, graph: &AdjacencyGraph) -> Vec<usize> {
        (0..self.len()).filter(|&u| self.is_border(graph, u)).collect()
    }

    /// External `id -> region` view, ordered by id.
    pub fn to_map(&self, graph: &AdjacencyGraph) -> BTreeMap<String, u32> {
        self.regions
            .iter()
            .enumerate()
            .map(|(u, &r)| (graph.id(u).to_string(), r))
            .collect()
    }
}

/// Derived per-region statistics shipped with every generation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAggregate {
    pub region: u32,
    pub population: u64,
    /// Population-weighted mean lean, or the plain mean when the region has no population.
    pub avg_lean: f64,
    pub weight: u32,
    pub units: usize,
}

pub fn aggregate(
    assignment: &Assignment,
    attrs: &UnitAttributes,
    scheme: &WeightScheme,
) -> Vec<RegionAggregate> {
    let r_count = assignment.region_count() as usize;
    let mut population = vec![0u64; r_count];
    let mut weighted = vec![0.0f64; r_count];
    let mut plain = vec![0.0f64; r_count];
    let mut units = vec![0usize; r_count];

    for (u, &r) in assignment.labels().iter().enumerate() {
        let r = r as usize;
        let p = attrs.population(u);
        population[r] += p;
        weighted[r] += p as f64 * attrs.lean(u);
        plain[r] += attrs.lean(u);
        units[r] += 1;
    }

    let weights = scheme.weights(&population, attrs.total_population());

    (0..r_count)
        .map(|r| {
            let avg_lean = if population[r] > 0 {
                weighted[r] / population[r] as f64
            } else if units[r] > 0 {
                plain[r] / units[r] as f64
            } else {
                0.0
            };
            RegionAggregate {
                region: r as u32,
                population: population[r],
                avg_lean,
                weight: weights[r],
                units: units[r],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_out_of_range_label_rejected() {
        let err = Assignment::new(vec![0, 1, 2], 2).unwrap_err();
        assert!(matches!(err, BorderForgeError::DataIntegrity(_)));
    }

    #[test]
    fn test_from_map_requires_every_unit() {
        let ids: Vec<String> = vec!["a".into(), "b".into()];
        let g = AdjacencyGraph::from_index_edges(ids, vec![(0, 1)]).unwrap();
        let mut map = HashMap::new();
        map.insert("a".to_string(), 0);
        assert!(Assignment::from_map(&g, &map, 2).is_err());
        map.insert("b".to_string(), 1);
        let a = Assignment::from_map(&g, &map, 2).unwrap();
        assert_eq!(a.labels(), &[0, 1]);
    }

    #[test]
    fn test_empty_region_aggregate() {
        let attrs = UnitAttributes::new(vec![5, 7], vec![0.2, -0.4]).unwrap();
        let a = Assignment::new(vec![0, 0], 2).unwrap();
        let agg = aggregate(&a, &attrs, &WeightScheme::Proportional { total_weight: 10 });
        assert_eq!(agg[1].units, 0);
        assert_eq!(agg[1].population, 0);
        assert_eq!(agg[1].avg_lean, 0.0);
        assert_eq!(agg[0].weight, 10);
    }

    proptest! {
        #[test]
        fn prop_aggregate_population_is_member_sum(
            pops in prop::collection::vec(0u64..10_000, 1..40),
            labels_seed in any::<u64>(),
            r_count in 1u32..6,
        ) {
            let n = pops.len();
            let leans = vec![0.0; n];
            let attrs = UnitAttributes::new(pops.clone(), leans).unwrap();
            let mut rng = fastrand::Rng::with_seed(labels_seed);
            let labels: Vec<u32> = (0..n).map(|_| rng.u32(0..r_count)).collect();
            let a = Assignment::new(labels.clone(), r_count).unwrap();

            let agg = aggregate(&a, &attrs, &WeightScheme::Proportional { total_weight: 538 });
            for row in &agg {
                let expected: u64 = (0..n)
                    .filter(|&u| labels[u] == row.region)
                    .map(|u| pops[u])
                    .sum();
                prop_assert_eq!(row.population, expected, "Population not conserved!");
            }
            let units: usize = agg.iter().map(|r| r.units).sum();
            prop_assert_eq!(units, n);
        }
    }
}
