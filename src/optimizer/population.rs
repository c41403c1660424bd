use super::crossover::region_crossover;
use super::initialization::grow_random_assignment;
use super::mutation::border_mutation;
use super::EvolutionOptions;
use crate::assignment::Assignment;
use crate::fitness::{Evaluation, FitnessEvaluator, SubScores};
use fastrand::Rng;
use std::cmp::Ordering;
use std::sync::Arc;

/// A scored chromosome. Never mutated after scoring; the assignment is shared.
#[derive(Debug, Clone)]
pub struct Individual {
    pub assignment: Arc<Assignment>,
    pub fitness: f64,
    pub subscores: SubScores,
}

impl Individual {
    pub fn scored(assignment: Arc<Assignment>, eval: Evaluation) -> Self {
        Self {
            assignment,
            fitness: eval.fitness,
            subscores: eval.subscores,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
    generation: u64,
}

impl Population {
    pub fn new(mut individuals: Vec<Individual>, generation: u64) -> Self {
        rank(&mut individuals);
        Self {
            individuals,
            generation,
        }
    }

    /// Generation zero: the reference plan (when given) plus randomly grown plans.
    pub fn seeded(
        evaluator: &FitnessEvaluator,
        reference: Option<&Assignment>,
        region_count: u32,
        opts: &EvolutionOptions,
        rng: &mut Rng,
    ) -> Self {
        let graph = evaluator.graph();
        let mut plans = Vec::with_capacity(opts.population_size);
        if let Some(r) = reference {
            plans.push(Arc::new(r.clone()));
        }
        while plans.len() < opts.population_size {
            plans.push(Arc::new(grow_random_assignment(graph, region_count, rng)));
        }
        let evals = evaluator.evaluate_many(&plans, opts.parallel_eval);
        let individuals = plans
            .into_iter()
            .zip(evals)
            .map(|(a, e)| Individual::scored(a, e))
            .collect();
        Self::new(individuals, 0)
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Highest fitness; the population is kept ranked so this is index 0.
    pub fn top(&self) -> &Individual {
        &self.individuals[0]
    }

    pub fn fitness_values(&self) -> Vec<f64> {
        self.individuals.iter().map(|i| i.fitness).collect()
    }

    /// `k` uniform draws with replacement; the fittest wins, ties go to the earliest draw.
    pub fn tournament(&self, k: usize, rng: &mut Rng) -> &Individual {
        let mut best = &self.individuals[rng.usize(0..self.individuals.len())];
        for _ in 1..k {
            let candidate = &self.individuals[rng.usize(0..self.individuals.len())];
            if candidate.fitness > best.fitness {
                best = candidate;
            }
        }
        best
    }

    pub fn weakest_index(&self) -> usize {
        self.individuals
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.fitness.total_cmp(&b.fitness))
            .map_or(0, |(i, _)| i)
    }

    /// Overwrites one slot and restores the ranking.
    pub fn replace(&mut self, index: usize, individual: Individual) {
        self.individuals[index] = individual;
        rank(&mut self.individuals);
    }

    /// One generation: elites carried over, the rest bred by
    /// tournament, crossover and mutation, then scored.
    ///
    /// Breeding draws from `rng` sequentially so results do not depend on
    /// thread scheduling; only scoring runs in parallel.
    pub fn advance(&mut self, evaluator: &FitnessEvaluator, opts: &EvolutionOptions, rng: &mut Rng) {
        let graph = evaluator.graph();
        let size = self.individuals.len();
        let elites = opts.elite_count.min(size);

        let children: Vec<Arc<Assignment>> = (elites..size)
            .map(|_| {
                let a = self.tournament(opts.tournament_size, rng);
                let b = self.tournament(opts.tournament_size, rng);
                let child = region_crossover(
                    graph,
                    &a.assignment,
                    &b.assignment,
                    opts.crossover_min_units,
                    opts.crossover_max_fraction,
                    rng,
                );
                let (child, _) =
                    border_mutation(graph, evaluator.attrs(), &child, &opts.mutation, rng);
                Arc::new(child)
            })
            .collect();

        let evals = evaluator.evaluate_many(&children, opts.parallel_eval);

        self.individuals.truncate(elites);
        self.individuals.extend(
            children
                .into_iter()
                .zip(evals)
                .map(|(a, e)| Individual::scored(a, e)),
        );
        rank(&mut self.individuals);
        self.generation += 1;
    }
}

/// Stable sort by fitness, best first.
fn rank(individuals: &mut [Individual]) {
    individuals.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));
}
