pub mod crossover;
pub mod initialization;
pub mod mutation;
pub mod population;

pub use self::population::{Individual, Population};

use crate::config::{BorderWalk, SearchParams};
use self::mutation::MutationParams;

/// Per-run breeding parameters, resolved from [`SearchParams`] plus the
/// border walk chosen when the run starts.
#[derive(Debug, Clone)]
pub struct EvolutionOptions {
    pub population_size: usize,
    pub elite_count: usize,
    pub tournament_size: usize,
    pub crossover_min_units: usize,
    pub crossover_max_fraction: f64,
    pub mutation: MutationParams,
    pub parallel_eval: bool,
}

impl From<&SearchParams> for EvolutionOptions {
    fn from(p: &SearchParams) -> Self {
        Self {
            population_size: p.population_size,
            elite_count: p.elite_count,
            tournament_size: p.tournament_size,
            crossover_min_units: p.crossover_min_units,
            crossover_max_fraction: p.crossover_max_fraction,
            mutation: MutationParams {
                rate: p.mutation_rate,
                walk: BorderWalk::Standard,
                guard: p.contiguity_guard,
                min_region_population: p.min_region_population,
            },
            parallel_eval: p.parallel_eval,
        }
    }
}

impl EvolutionOptions {
    pub fn with_walk(mut self, walk: BorderWalk) -> Self {
        self.mutation.walk = walk;
        self
    }
}
