//! Region weights, the winner-take-all tally, and the reward used when the
//! search is asked to favour one side.

use crate::assignment::RegionAggregate;
use crate::config::{FitnessWeights, TargetSide, WeightRule};
use crate::error::{BfResult, BorderForgeError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum WeightScheme {
    Proportional { total_weight: u32 },
    Fixed(Vec<u32>),
}

impl WeightScheme {
    pub fn from_config(
        weights: &FitnessWeights,
        fixed: Option<&[u32]>,
        region_count: u32,
    ) -> BfResult<Self> {
        match weights.weight_rule {
            WeightRule::Proportional => Ok(Self::Proportional {
                total_weight: weights.total_weight,
            }),
            WeightRule::Fixed => match fixed {
                Some(w) if w.len() == region_count as usize => Ok(Self::Fixed(w.to_vec())),
                Some(w) => Err(BorderForgeError::DataIntegrity(format!(
                    "Fixed weight rule needs {} region weights, got {}",
                    region_count,
                    w.len()
                ))),
                None => Err(BorderForgeError::DataIntegrity(
                    "Fixed weight rule selected but no region weights were supplied".into(),
                )),
            },
        }
    }

    pub fn weights(&self, populations: &[u64], total_population: u64) -> Vec<u32> {
        match self {
            Self::Fixed(w) => w.clone(),
            Self::Proportional { total_weight } => {
                if total_population == 0 {
                    return vec![0; populations.len()];
                }
                let scale = *total_weight as f64 / total_population as f64;
                populations
                    .iter()
                    .map(|&p| (p as f64 * scale).round() as u32)
                    .collect()
            }
        }
    }
}

/// Reward for one region with lean `lean` when optimizing towards `side`.
///
/// Narrow wins score close to 1, narrow losses close to -1; a landslide
/// is worth almost nothing either way. `Tie` rewards regions near zero.
#[inline]
pub fn reward(lean: f64, side: TargetSide) -> f64 {
    let x = match side {
        TargetSide::Side1 => lean,
        TargetSide::Side2 => -lean,
        TargetSide::Tie => return -lean.abs(),
    };
    sign(x) - x
}

#[inline(always)]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Weight-averaged reward over non-empty regions, in [-1, 1].
pub fn outcome_score(aggregates: &[RegionAggregate], side: TargetSide) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for a in aggregates.iter().filter(|a| a.units > 0) {
        let w = a.weight as f64;
        num += w * reward(a.avg_lean, side);
        den += w;
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub side1: u32,
    pub side2: u32,
    pub undecided: u32,
    pub winner: TargetSide,
}

/// Winner-take-all count of region weights by the sign of each region's lean.
pub fn tally(aggregates: &[RegionAggregate]) -> Tally {
    let mut side1 = 0;
    let mut side2 = 0;
    let mut undecided = 0;
    for a in aggregates.iter().filter(|a| a.units > 0) {
        if a.avg_lean > 0.0 {
            side1 += a.weight;
        } else if a.avg_lean < 0.0 {
            side2 += a.weight;
        } else {
            undecided += a.weight;
        }
    }
    let winner = match side1.cmp(&side2) {
        std::cmp::Ordering::Greater => TargetSide::Side1,
        std::cmp::Ordering::Less => TargetSide::Side2,
        std::cmp::Ordering::Equal => TargetSide::Tie,
    };
    Tally {
        side1,
        side2,
        undecided,
        winner,
    }
}
