pub mod contiguity;
pub mod outcome;

use crate::assignment::{aggregate, Assignment, RegionAggregate};
use crate::config::{FitnessWeights, TargetSide};
use crate::graph::{AdjacencyGraph, UnitAttributes};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use self::contiguity::{components_by_region, fragmentation_penalty};
use self::outcome::{outcome_score, WeightScheme};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub homogeneity: f64,
    pub balance: f64,
    /// Fragmentation penalty, `sum_r (k_r - 1)^2`. Zero means every region is contiguous.
    pub contiguity: f64,
    pub outcome: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub fitness: f64,
    pub subscores: SubScores,
}

/// Scores assignments. Pure: the same assignment always yields the same evaluation.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    graph: Arc<AdjacencyGraph>,
    attrs: Arc<UnitAttributes>,
    weights: FitnessWeights,
    scheme: WeightScheme,
    target: Option<TargetSide>,
}

impl FitnessEvaluator {
    pub fn new(
        graph: Arc<AdjacencyGraph>,
        attrs: Arc<UnitAttributes>,
        weights: FitnessWeights,
        scheme: WeightScheme,
    ) -> Self {
        Self {
            graph,
            attrs,
            weights,
            scheme,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Option<TargetSide>) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> Option<TargetSide> {
        self.target
    }

    pub fn graph(&self) -> &Arc<AdjacencyGraph> {
        &self.graph
    }

    pub fn attrs(&self) -> &Arc<UnitAttributes> {
        &self.attrs
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    pub fn aggregates(&self, assignment: &Assignment) -> Vec<RegionAggregate> {
        aggregate(assignment, &self.attrs, &self.scheme)
    }

    pub fn evaluate(&self, assignment: &Assignment) -> Evaluation {
        let members = assignment.members_by_region();
        let total = self.attrs.total_population();

        let mut weighted_variance = 0.0;
        let mut empty_regions = 0usize;
        let mut region_pops = Vec::with_capacity(members.len());

        for units in &members {
            if units.is_empty() {
                empty_regions += 1;
                region_pops.push(0.0);
                continue;
            }
            let pop: u64 = units.iter().map(|&u| self.attrs.population(u)).sum();
            region_pops.push(pop as f64);
            if pop == 0 {
                continue;
            }
            let pop = pop as f64;
            let mean = units
                .iter()
                .map(|&u| self.attrs.population(u) as f64 * self.attrs.lean(u))
                .sum::<f64>()
                / pop;
            let variance = units
                .iter()
                .map(|&u| {
                    let d = self.attrs.lean(u) - mean;
                    self.attrs.population(u) as f64 * d * d
                })
                .sum::<f64>()
                / pop;
            // Population-weighted: P_r * var_r, normalized by total below.
            weighted_variance += pop * variance;
        }

        let h = if total > 0 {
            weighted_variance / total as f64
        } else {
            0.0
        };
        let homogeneity = 1.0 - h - self.weights.penalty_empty_region * empty_regions as f64;

        let balance = if total > 0 {
            let target = total as f64 / region_pops.len() as f64;
            let mean_sq = region_pops
                .iter()
                .map(|&p| {
                    let dev = (p - target) / target;
                    dev * dev
                })
                .sum::<f64>()
                / region_pops.len() as f64;
            1.0 / (1.0 + mean_sq)
        } else {
            1.0
        };

        let components = components_by_region(&self.graph, assignment, &members);
        let contiguity = fragmentation_penalty(&components);

        let outcome = match self.target {
            Some(side) => outcome_score(&self.aggregates(assignment), side),
            None => 0.0,
        };

        let w = &self.weights;
        let fitness = w.weight_homogeneity * homogeneity + w.weight_balance * balance
            - w.weight_contiguity * contiguity
            + w.weight_outcome * outcome;

        Evaluation {
            fitness,
            subscores: SubScores {
                homogeneity,
                balance,
                contiguity,
                outcome,
            },
        }
    }

    /// Scores a batch in input order. The parallel path gives identical results.
    pub fn evaluate_many(&self, assignments: &[Arc<Assignment>], parallel: bool) -> Vec<Evaluation> {
        if parallel {
            assignments.par_iter().map(|a| self.evaluate(a)).collect()
        } else {
            assignments.iter().map(|a| self.evaluate(a)).collect()
        }
    }
}
