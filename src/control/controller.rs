use super::protocol::{Command, Event, GenerationSummary, RunSnapshot, RunStatus};
use crate::assignment::Assignment;
use crate::config::{BorderWalk, Config, TargetSide};
use crate::dataset::Bootstrap;
use crate::error::{BfResult, BorderForgeError};
use crate::fitness::outcome::{tally, WeightScheme};
use crate::fitness::FitnessEvaluator;
use crate::optimizer::initialization::grow_random_assignment;
use crate::optimizer::{EvolutionOptions, Individual, Population};
use fastrand::Rng;
use tracing::{debug, info, warn};

/// Mixed into the seed for the fallback reference plan so it does not
/// share a stream with the run itself.
const REFERENCE_SEED_SALT: u64 = 0x5EED_B0BD;

/// Generation loop and run state machine.
///
/// The controller is synchronous: [`handle`](Self::handle) applies one command
/// and [`advance`](Self::advance) runs one generation. Both return the events
/// produced. The worker thread drives it; tests can drive it directly.
pub struct RunController {
    bootstrap: Bootstrap,
    config: Config,
    base_evaluator: FitnessEvaluator,
    evaluator: FitnessEvaluator,
    reference: Assignment,
    seed: Option<u64>,
    rng: Rng,

    status: RunStatus,
    population: Option<Population>,
    best: Option<Individual>,
    best_generation: u64,
    target_generations: u64,
    render_every: u64,
    target_side: Option<TargetSide>,
    opts: EvolutionOptions,
}

impl RunController {
    pub fn new(bootstrap: Bootstrap, config: Config, seed: Option<u64>) -> BfResult<Self> {
        config.validate()?;
        let r = bootstrap.region_count;
        if r == 0 || r as usize > bootstrap.unit_count() {
            return Err(BorderForgeError::Config(format!(
                "region count {} must lie in 1..={}",
                r,
                bootstrap.unit_count()
            )));
        }

        config
            .search
            .validate_for(r, bootstrap.attrs.total_population())?;

        let scheme = WeightScheme::from_config(&config.weights, bootstrap.region_weights.as_deref(), r)?;
        let base_evaluator = FitnessEvaluator::new(
            bootstrap.graph.clone(),
            bootstrap.attrs.clone(),
            config.weights.clone(),
            scheme,
        );

        let reference = match &bootstrap.reference {
            Some(a) => a.clone(),
            None => {
                let mut rng = seeded_rng(seed.map(|s| s ^ REFERENCE_SEED_SALT));
                grow_random_assignment(&bootstrap.graph, r, &mut rng)
            }
        };

        info!(
            units = bootstrap.unit_count(),
            regions = r,
            population = config.search.population_size,
            seed = ?seed,
            "run controller ready"
        );

        let opts = EvolutionOptions::from(&config.search);
        Ok(Self {
            evaluator: base_evaluator.clone(),
            base_evaluator,
            bootstrap,
            config,
            reference,
            seed,
            rng: seeded_rng(seed),
            status: RunStatus::Idle,
            population: None,
            best: None,
            best_generation: 0,
            target_generations: 0,
            render_every: 1,
            target_side: None,
            opts,
        })
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Running or Stopping: the loop still has work to do.
    pub fn is_active(&self) -> bool {
        matches!(self.status, RunStatus::Running | RunStatus::Stopping)
    }

    pub fn generation(&self) -> u64 {
        self.population.as_ref().map_or(0, Population::generation)
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// Fittest individual observed in this run, which may have left the population.
    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    pub fn best_generation(&self) -> u64 {
        self.best_generation
    }

    pub fn reference(&self) -> &Assignment {
        &self.reference
    }

    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    /// Applies a command. Rejected commands produce a single `Error` event
    /// and leave the run untouched.
    pub fn handle(&mut self, cmd: Command) -> Vec<Event> {
        let result = match cmd {
            Command::Start {
                generations,
                render_every,
                resume,
                target_side,
                mode,
            } => self.start(generations, render_every, resume, target_side, mode),
            Command::Stop => self.stop(),
            Command::Reset => Ok(self.reset()),
            Command::RestoreBest => self.restore_best(),
            Command::Snapshot => Ok(vec![Event::Snapshot(self.snapshot())]),
        };
        result.unwrap_or_else(|e| {
            warn!(status = %self.status, error = %e, "command rejected");
            vec![Event::error(&e)]
        })
    }

    fn start(
        &mut self,
        generations: u64,
        render_every: u64,
        resume: bool,
        target_side: Option<TargetSide>,
        mode: Option<BorderWalk>,
    ) -> BfResult<Vec<Event>> {
        if generations == 0 {
            return Err(BorderForgeError::Config("generations must be at least 1".into()));
        }
        if render_every == 0 {
            return Err(BorderForgeError::Config("render_every must be at least 1".into()));
        }
        if self.is_active() {
            return Err(BorderForgeError::InvalidCommand(
                "Algorithm already running".into(),
            ));
        }

        if resume {
            return self.resume(generations, render_every, target_side, mode);
        }

        self.rng = seeded_rng(self.seed);
        self.target_side = target_side;
        self.evaluator = self.base_evaluator.clone().with_target(target_side);
        self.opts = EvolutionOptions::from(&self.config.search).with_walk(mode.unwrap_or_default());

        let population = Population::seeded(
            &self.evaluator,
            Some(&self.reference),
            self.bootstrap.region_count,
            &self.opts,
            &mut self.rng,
        );
        self.best = Some(population.top().clone());
        self.best_generation = 0;
        self.population = Some(population);
        self.target_generations = generations;
        self.render_every = render_every;
        self.status = RunStatus::Running;

        info!(
            generations,
            render_every,
            target = ?target_side,
            mode = %self.opts.mutation.walk,
            "run started"
        );

        let mut events = vec![Event::Started {
            generation: 0,
            total: generations,
            resumed: false,
        }];
        events.extend(self.summary().map(Event::GenerationUpdate));
        Ok(events)
    }

    fn resume(
        &mut self,
        generations: u64,
        render_every: u64,
        target_side: Option<TargetSide>,
        mode: Option<BorderWalk>,
    ) -> BfResult<Vec<Event>> {
        if self.status != RunStatus::Paused {
            return Err(BorderForgeError::InvalidCommand(format!(
                "cannot resume: run is {}, not paused",
                self.status
            )));
        }
        if target_side.is_some() && target_side != self.target_side {
            return Err(BorderForgeError::InvalidCommand(
                "target side cannot change when resuming".into(),
            ));
        }
        let generation = self.generation();
        if generations <= generation {
            return Err(BorderForgeError::Config(format!(
                "target generation {} already reached (paused at {})",
                generations, generation
            )));
        }
        if let Some(walk) = mode {
            self.opts.mutation.walk = walk;
        }
        self.target_generations = generations;
        self.render_every = render_every;
        self.status = RunStatus::Running;

        info!(generation, generations, "run resumed");
        Ok(vec![Event::Started {
            generation,
            total: generations,
            resumed: true,
        }])
    }

    fn stop(&mut self) -> BfResult<Vec<Event>> {
        if self.status != RunStatus::Running {
            return Err(BorderForgeError::InvalidCommand(format!(
                "cannot stop: run is {}",
                self.status
            )));
        }
        self.status = RunStatus::Stopping;
        Ok(vec![Event::Stopping])
    }

    fn reset(&mut self) -> Vec<Event> {
        self.status = RunStatus::Idle;
        self.population = None;
        self.best = None;
        self.best_generation = 0;
        self.target_generations = 0;
        self.target_side = None;
        self.evaluator = self.base_evaluator.clone();

        info!("run reset");
        vec![Event::ResetComplete {
            assignment: self.reference.to_map(&self.bootstrap.graph),
            region_aggregates: self.evaluator.aggregates(&self.reference),
        }]
    }

    fn restore_best(&mut self) -> BfResult<Vec<Event>> {
        if self.status != RunStatus::Paused {
            return Err(BorderForgeError::InvalidCommand(format!(
                "best can only be restored while paused (run is {})",
                self.status
            )));
        }
        let (Some(population), Some(best)) = (self.population.as_mut(), self.best.as_ref()) else {
            return Err(BorderForgeError::InvalidCommand("no run to restore into".into()));
        };
        let slot = population.weakest_index();
        population.replace(slot, best.clone());
        debug!(slot, score = best.fitness, "best individual restored");
        Ok(vec![Event::BestRestored {
            score: best.fitness,
            generation: self.best_generation,
        }])
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            status: self.status,
            generation: self.generation(),
            target_generations: self.target_generations,
            best_score: self.best.as_ref().map(|b| b.fitness),
            best_generation: self.best_generation,
            target_side: self.target_side,
            fitness: self
                .population
                .as_ref()
                .map(Population::fitness_values)
                .unwrap_or_default(),
        }
    }

    /// Runs one generation (or finishes a pending stop) and reports what happened.
    /// Does nothing unless the run is active.
    pub fn advance(&mut self) -> Vec<Event> {
        match self.status {
            RunStatus::Running => self.step(),
            RunStatus::Stopping => {
                self.status = RunStatus::Paused;
                let generation = self.generation();
                info!(generation, total = self.target_generations, "run paused");
                let mut events: Vec<Event> =
                    self.summary().map(Event::GenerationUpdate).into_iter().collect();
                events.push(Event::Paused {
                    generation,
                    total: self.target_generations,
                });
                events
            }
            _ => Vec::new(),
        }
    }

    fn step(&mut self) -> Vec<Event> {
        let Some(population) = self.population.as_mut() else {
            return Vec::new();
        };
        population.advance(&self.evaluator, &self.opts, &mut self.rng);
        let generation = population.generation();
        let top = population.top();

        let improved = self.best.as_ref().map_or(true, |b| top.fitness > b.fitness);
        if improved {
            self.best = Some(top.clone());
            self.best_generation = generation;
        }

        let mut events = Vec::new();
        if generation >= self.target_generations {
            self.status = RunStatus::Completed;
            events.extend(self.summary().map(Event::GenerationUpdate));
            let best_score = self.best.as_ref().map_or(f64::NEG_INFINITY, |b| b.fitness);
            info!(generation, best_score, best_generation = self.best_generation, "run completed");
            events.push(Event::Completed {
                generation,
                best_score,
            });
        } else if generation % self.render_every == 0 {
            if let Some(summary) = self.summary() {
                debug!(
                    generation,
                    score = summary.score,
                    best = summary.best_score,
                    contiguity = summary.subscores.contiguity,
                    "generation"
                );
                events.push(Event::GenerationUpdate(summary));
            }
        }
        events
    }

    fn summary(&self) -> Option<GenerationSummary> {
        let population = self.population.as_ref()?;
        let top = population.top();
        let region_aggregates = self.evaluator.aggregates(&top.assignment);
        Some(GenerationSummary {
            generation: population.generation(),
            assignment: top.assignment.to_map(&self.bootstrap.graph),
            tally: tally(&region_aggregates),
            region_aggregates,
            score: top.fitness,
            subscores: top.subscores,
            best_score: self.best.as_ref().map_or(top.fitness, |b| b.fitness),
            best_generation: self.best_generation,
        })
    }
}

fn seeded_rng(seed: Option<u64>) -> Rng {
    match seed {
        Some(s) => Rng::with_seed(s),
        None => Rng::new(),
    }
}
