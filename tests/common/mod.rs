#![allow(dead_code)]

use borderforge::config::Config;
use borderforge::control::RunController;
use borderforge::dataset::synthetic::{grid_graph, GridSize, SyntheticGrid};
use borderforge::dataset::{Bootstrap, BootstrapParams};
use borderforge::graph::Unit;

/// 2x2 grid, top row leaning +1, bottom row -1, 100 people each.
///
/// ```text
/// r0c0 r0c1   (+1 +1)
/// r1c0 r1c1   (-1 -1)
/// ```
pub fn square_bootstrap() -> Bootstrap {
    let graph = grid_graph(2, 2).unwrap();
    let leans = [1.0, 1.0, -1.0, -1.0];
    let units = graph
        .ids()
        .iter()
        .zip(leans)
        .map(|(id, lean)| Unit {
            id: id.clone(),
            population: 100,
            lean,
        })
        .collect();
    BootstrapParams::builder()
        .graph(graph)
        .units(units)
        .region_count(2)
        .build()
        .build_bootstrap()
        .unwrap()
}

pub fn grid_bootstrap(width: usize, height: usize, regions: u32, seed: u64) -> Bootstrap {
    SyntheticGrid::builder()
        .size(GridSize { width, height })
        .region_count(regions)
        .seed(Some(seed))
        .build()
        .generate()
        .unwrap()
}

/// Small population and serial evaluation so runs are quick.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.search.population_size = 20;
    config.search.parallel_eval = false;
    config
}

pub fn controller(bootstrap: Bootstrap, seed: u64) -> RunController {
    RunController::new(bootstrap, test_config(), Some(seed)).unwrap()
}
