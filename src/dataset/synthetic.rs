//! Synthetic maps for experiments and tests: rectangular grids with
//! generated populations and leans.

use super::{Bootstrap, BootstrapParams};
use crate::config::TargetSide;
use crate::consts::{SYNTHETIC_POP_MAX, SYNTHETIC_POP_MIN, SYNTHETIC_STATE_LEAN_RANGE};
use crate::error::{BfResult, BorderForgeError};
use crate::graph::{AdjacencyGraph, Unit};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use typed_builder::TypedBuilder;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
pub enum LeanModel {
    /// Per-region base lean, units scattered around it.
    #[default]
    StateBased,
    /// Independent `N(bias, std)` per unit.
    Uniform,
    /// `Uniform` around `±margin`; the sign of `bias` picks the winner.
    Landslide,
    /// `Uniform` with no bias.
    Close,
}

/// Parsed form of `grid:WxH` (the `grid:` prefix is optional).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

impl FromStr for GridSize {
    type Err = BorderForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim().strip_prefix("grid:").unwrap_or(s.trim());
        let parsed = body
            .split_once(['x', 'X'])
            .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
        match parsed {
            Some((width, height)) if width > 0 && height > 0 => Ok(Self { width, height }),
            _ => Err(BorderForgeError::Config(format!(
                "expected a grid like 'grid:8x6', got '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct SyntheticGrid {
    pub size: GridSize,
    pub region_count: u32,
    #[builder(default)]
    pub lean_model: LeanModel,
    #[builder(default = 0.0)]
    pub bias: f64,
    #[builder(default = 0.3)]
    pub std: f64,
    #[builder(default = 0.0)]
    pub shift: f64,
    #[builder(default = false)]
    pub flip: bool,
    #[builder(default)]
    pub seed: Option<u64>,
}

impl SyntheticGrid {
    pub fn generate(&self) -> BfResult<Bootstrap> {
        let mut rng = match self.seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        let GridSize { width, height } = self.size;
        let n = width * height;
        let graph = grid_graph(width, height)?;
        let strips = serpentine_strips(width, height, self.region_count.max(1));

        let mut leans = match self.lean_model {
            LeanModel::StateBased => state_based_leans(&mut rng, &strips),
            LeanModel::Uniform => uniform_random_leans(&mut rng, n, self.bias, self.std),
            LeanModel::Landslide => {
                let winner = if self.bias < 0.0 {
                    TargetSide::Side2
                } else {
                    TargetSide::Side1
                };
                landslide_leans(&mut rng, n, winner, self.bias.abs(), self.std)
            }
            LeanModel::Close => uniform_random_leans(&mut rng, n, 0.0, self.std),
        };
        if self.shift != 0.0 {
            apply_shift(&mut leans, self.shift);
        }
        if self.flip {
            flip(&mut leans);
        }
        let populations = random_populations(&mut rng, n);

        let units = graph
            .ids()
            .iter()
            .zip(populations)
            .zip(leans)
            .map(|((id, population), lean)| Unit {
                id: id.clone(),
                population,
                lean,
            })
            .collect();
        let reference: HashMap<String, u32> = graph.ids().iter().cloned().zip(strips).collect();

        BootstrapParams::builder()
            .graph(graph)
            .units(units)
            .region_count(self.region_count)
            .reference(Some(reference))
            .build()
            .build_bootstrap()
    }
}

/// 4-neighbour grid. Unit `r*width + c` has id `r{r}c{c}`.
pub fn grid_graph(width: usize, height: usize) -> BfResult<AdjacencyGraph> {
    let ids = (0..height)
        .flat_map(|r| (0..width).map(move |c| format!("r{}c{}", r, c)))
        .collect();
    let mut edges = Vec::new();
    for r in 0..height {
        for c in 0..width {
            let u = r * width + c;
            if c + 1 < width {
                edges.push((u, u + 1));
            }
            if r + 1 < height {
                edges.push((u, u + width));
            }
        }
    }
    AdjacencyGraph::from_index_edges(ids, edges)
}

/// Cuts the boustrophedon walk of the grid into `regions` equal runs.
/// Consecutive cells of the walk are adjacent, so every run is contiguous.
pub fn serpentine_strips(width: usize, height: usize, regions: u32) -> Vec<u32> {
    let n = width * height;
    let mut labels = vec![0; n];
    let mut step = 0usize;
    for r in 0..height {
        for k in 0..width {
            let c = if r % 2 == 0 { k } else { width - 1 - k };
            labels[r * width + c] = (step * regions as usize / n) as u32;
            step += 1;
        }
    }
    labels
}

/// Box-Muller sample from `N(mean, std)`.
pub fn normal(rng: &mut fastrand::Rng, mean: f64, std: f64) -> f64 {
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + std * z
}

/// Each region gets a base lean `X ~ U(-20, 20)` points; its units are drawn
/// from `N(X, |X| + 1)` points and scaled to [-1, 1].
pub fn state_based_leans(rng: &mut fastrand::Rng, labels: &[u32]) -> Vec<f64> {
    let regions = labels.iter().max().map_or(0, |&m| m as usize + 1);
    let range = SYNTHETIC_STATE_LEAN_RANGE;
    let base: Vec<f64> = (0..regions)
        .map(|_| rng.f64() * 2.0 * range - range)
        .collect();
    labels
        .iter()
        .map(|&r| {
            let x = base[r as usize];
            (normal(rng, x, x.abs() + 1.0) / 100.0).clamp(-1.0, 1.0)
        })
        .collect()
}

pub fn uniform_random_leans(rng: &mut fastrand::Rng, n: usize, bias: f64, std: f64) -> Vec<f64> {
    (0..n)
        .map(|_| normal(rng, bias, std).clamp(-1.0, 1.0))
        .collect()
}

pub fn landslide_leans(
    rng: &mut fastrand::Rng,
    n: usize,
    winner: TargetSide,
    margin: f64,
    std: f64,
) -> Vec<f64> {
    let bias = match winner {
        TargetSide::Side2 => -margin,
        _ => margin,
    };
    uniform_random_leans(rng, n, bias, std)
}

/// Uniform swing. Results stay strictly inside (-1, 1).
pub fn apply_shift(leans: &mut [f64], shift: f64) {
    for l in leans {
        *l = (*l + shift).clamp(-0.999, 0.999);
    }
}

pub fn flip(leans: &mut [f64]) {
    for l in leans {
        *l = -*l;
    }
}

pub fn random_populations(rng: &mut fastrand::Rng, n: usize) -> Vec<u64> {
    (0..n)
        .map(|_| rng.u64(SYNTHETIC_POP_MIN..SYNTHETIC_POP_MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::contiguity::connected_components;

    #[test]
    fn test_grid_parse() {
        assert_eq!(
            "grid:4x3".parse::<GridSize>().unwrap(),
            GridSize { width: 4, height: 3 }
        );
        assert!("grid:0x3".parse::<GridSize>().is_err());
        assert!("banana".parse::<GridSize>().is_err());
    }

    #[test]
    fn test_strips_are_contiguous() {
        let (w, h) = (7, 5);
        let g = grid_graph(w, h).unwrap();
        for r_count in 1..=8 {
            let labels = serpentine_strips(w, h, r_count);
            let a = crate::assignment::Assignment::new(labels, r_count).unwrap();
            for r in 0..r_count {
                assert_eq!(connected_components(&g, &a, r), 1, "R={} region {}", r_count, r);
            }
        }
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        let build = || {
            SyntheticGrid::builder()
                .size(GridSize { width: 5, height: 4 })
                .region_count(3)
                .seed(Some(9))
                .build()
                .generate()
                .unwrap()
        };
        let (a, b) = (build(), build());
        for u in 0..a.unit_count() {
            assert_eq!(a.attrs.lean(u), b.attrs.lean(u));
            assert_eq!(a.attrs.population(u), b.attrs.population(u));
            assert!((-1.0..=1.0).contains(&a.attrs.lean(u)));
        }
        assert!(a.reference.is_some());
    }

    #[test]
    fn test_shift_and_flip() {
        let mut leans = vec![0.5, -0.2, 0.99];
        apply_shift(&mut leans, 0.1);
        assert!((leans[0] - 0.6).abs() < 1e-12);
        assert_eq!(leans[2], 0.999);
        flip(&mut leans);
        assert!((leans[1] - 0.1).abs() < 1e-12);
    }
}
