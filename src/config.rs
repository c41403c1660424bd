use crate::consts::{DEFAULT_SUMMARY_CAPACITY, DEFAULT_TOTAL_WEIGHT};
use crate::error::{BfResult, BorderForgeError};
use clap::{parser::ValueSource, ArgAction, ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumString};
use tracing::warn;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub weights: FitnessWeights,
    #[command(flatten)]
    pub sides: SideConfig,
}

impl Config {
    /// Rejects parameter combinations the optimizer cannot run with.
    pub fn validate(&self) -> BfResult<()> {
        self.search.validate()?;
        self.weights.validate()
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 60)]
    pub population_size: usize,
    #[arg(long, default_value_t = 2)]
    pub elite_count: usize,
    #[arg(long, default_value_t = 4)]
    pub tournament_size: usize,
    #[arg(long, default_value_t = 0.05)]
    pub mutation_rate: f64,

    // Donor region size for crossover
    #[arg(long, default_value_t = 1)]
    pub crossover_min_units: usize,
    #[arg(long, default_value_t = 0.5)]
    pub crossover_max_fraction: f64,

    /// Skip mutations that would empty or split the source region.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub contiguity_guard: bool,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub parallel_eval: bool,
    /// Mutation never drops a region below this population. 0 disables it.
    #[arg(long, default_value_t = 0)]
    pub min_region_population: u64,

    /// Outbound event queue depth. Generation summaries beyond it are dropped.
    #[arg(long, default_value_t = DEFAULT_SUMMARY_CAPACITY)]
    pub summary_capacity: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 60,
            elite_count: 2,
            tournament_size: 4,
            mutation_rate: 0.05,
            crossover_min_units: 1,
            crossover_max_fraction: 0.5,
            contiguity_guard: true,
            parallel_eval: true,
            min_region_population: 0,
            summary_capacity: DEFAULT_SUMMARY_CAPACITY,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> BfResult<()> {
        if self.population_size < 2 {
            return Err(config_err("population_size must be at least 2"));
        }
        if self.elite_count >= self.population_size {
            return Err(config_err(format!(
                "elite_count ({}) must be smaller than population_size ({})",
                self.elite_count, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(config_err("tournament_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(config_err(format!(
                "mutation_rate must lie in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if self.crossover_min_units == 0 {
            return Err(config_err("crossover_min_units must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.crossover_max_fraction) {
            return Err(config_err(format!(
                "crossover_max_fraction must lie in [0, 1], got {}",
                self.crossover_max_fraction
            )));
        }
        if self.summary_capacity == 0 {
            return Err(config_err("summary_capacity must be at least 1"));
        }
        Ok(())
    }

    /// The floor must leave room for every region.
    pub fn validate_for(&self, regions: u32, total_population: u64) -> BfResult<()> {
        let needed = self.min_region_population.saturating_mul(u64::from(regions));
        if needed > total_population {
            return Err(config_err(format!(
                "min_region_population {} across {} regions exceeds the total population {}",
                self.min_region_population, regions, total_population
            )));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &SearchParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(population_size);
        update_if_present!(elite_count);
        update_if_present!(tournament_size);
        update_if_present!(mutation_rate);
        update_if_present!(crossover_min_units);
        update_if_present!(crossover_max_fraction);
        update_if_present!(contiguity_guard);
        update_if_present!(parallel_eval);
        update_if_present!(min_region_population);
        update_if_present!(summary_capacity);
    }
}

/// How region weights are derived.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeightRule {
    /// `round(population * total_weight / total_population)`
    Proportional,
    /// Per-region weights supplied with the bootstrap data.
    Fixed,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    #[arg(long, default_value_t = 1.0)]
    pub weight_homogeneity: f64,
    #[arg(long, default_value_t = 1.0)]
    pub weight_balance: f64,
    #[arg(long, default_value_t = 5.0)]
    pub weight_contiguity: f64,
    #[arg(long, default_value_t = 1.0)]
    pub weight_outcome: f64,

    // Subtracted from homogeneity once per empty region
    #[arg(long, default_value_t = 1.0)]
    pub penalty_empty_region: f64,

    #[arg(long, value_enum, default_value_t = WeightRule::Proportional)]
    pub weight_rule: WeightRule,
    #[arg(long, default_value_t = DEFAULT_TOTAL_WEIGHT)]
    pub total_weight: u32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            weight_homogeneity: 1.0,
            weight_balance: 1.0,
            weight_contiguity: 5.0,
            weight_outcome: 1.0,
            penalty_empty_region: 1.0,
            weight_rule: WeightRule::Proportional,
            total_weight: DEFAULT_TOTAL_WEIGHT,
        }
    }
}

impl FitnessWeights {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> BfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn validate(&self) -> BfResult<()> {
        let terms = [
            ("weight_homogeneity", self.weight_homogeneity),
            ("weight_balance", self.weight_balance),
            ("weight_contiguity", self.weight_contiguity),
            ("weight_outcome", self.weight_outcome),
            ("penalty_empty_region", self.penalty_empty_region),
        ];
        for (name, value) in terms {
            if !value.is_finite() || value < 0.0 {
                return Err(config_err(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.contiguity_dominates() {
            warn!(
                w_c = self.weight_contiguity,
                w_h = self.weight_homogeneity,
                w_b = self.weight_balance,
                w_o = self.weight_outcome,
                "contiguity weight does not dominate; fragmented plans may outscore contiguous ones"
            );
        }
        Ok(())
    }

    /// True when a single fragment costs more than homogeneity, balance and
    /// the full outcome range (reward lies in [-1, 1]) can gain.
    pub fn contiguity_dominates(&self) -> bool {
        self.weight_contiguity
            > self.weight_homogeneity + self.weight_balance + 2.0 * self.weight_outcome
    }

    pub fn merge_from_cli(&mut self, cli: &FitnessWeights, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(weight_homogeneity);
        update_if_present!(weight_balance);
        update_if_present!(weight_contiguity);
        update_if_present!(weight_outcome);
        update_if_present!(penalty_empty_region);
        update_if_present!(weight_rule);
        update_if_present!(total_weight);
    }
}

/// Side the optimizer should favour when the outcome term is active.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetSide {
    Side1,
    Side2,
    Tie,
}

/// Order in which mutation visits border units.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BorderWalk {
    #[default]
    Standard,
    Bfs,
    Dfs,
    /// The region that just lost a unit grows next.
    FollowTheLeader,
}

/// Display names for the two sides of the lean axis.
/// Positive lean belongs to side 1.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    #[arg(long, default_value = "GOP")]
    pub side1_name: String,
    #[arg(long, default_value = "#d62728")]
    pub side1_color: String,
    #[arg(long, default_value = "DEM")]
    pub side2_name: String,
    #[arg(long, default_value = "#1f77b4")]
    pub side2_color: String,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            side1_name: "GOP".to_string(),
            side1_color: "#d62728".to_string(),
            side2_name: "DEM".to_string(),
            side2_color: "#1f77b4".to_string(),
        }
    }
}

impl SideConfig {
    /// Accepts a configured side name, a canonical side key, or "tie".
    pub fn resolve(&self, label: &str) -> Option<TargetSide> {
        let label = label.trim();
        if label.eq_ignore_ascii_case(&self.side1_name) {
            return Some(TargetSide::Side1);
        }
        if label.eq_ignore_ascii_case(&self.side2_name) {
            return Some(TargetSide::Side2);
        }
        label.parse().ok()
    }

    pub fn name_of(&self, side: TargetSide) -> &str {
        match side {
            TargetSide::Side1 => &self.side1_name,
            TargetSide::Side2 => &self.side2_name,
            TargetSide::Tie => "Tie",
        }
    }
}

fn config_err(msg: impl Into<String>) -> BorderForgeError {
    BorderForgeError::Config(msg.into())
}
