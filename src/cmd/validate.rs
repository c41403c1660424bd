use crate::reports;
use borderforge::config::Config;
use borderforge::dataset::Bootstrap;
use borderforge::error::{BfResult, BorderForgeError};
use borderforge::fitness::outcome::WeightScheme;
use borderforge::fitness::FitnessEvaluator;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short = 't', long)]
    pub target_side: Option<String>,
}

/// Scores the current borders without evolving anything.
pub fn run(args: &ValidateArgs, bootstrap: &Bootstrap, config: &Config) -> BfResult<()> {
    let reference = bootstrap.reference.as_ref().ok_or_else(|| {
        BorderForgeError::Config("the dataset carries no reference assignment to validate".into())
    })?;
    let target = args
        .target_side
        .as_deref()
        .map(|label| {
            config.sides.resolve(label).ok_or_else(|| {
                BorderForgeError::Config(format!("unknown target side '{}'", label))
            })
        })
        .transpose()?;

    let scheme = WeightScheme::from_config(
        &config.weights,
        bootstrap.region_weights.as_deref(),
        bootstrap.region_count,
    )?;
    let evaluator = FitnessEvaluator::new(
        bootstrap.graph.clone(),
        bootstrap.attrs.clone(),
        config.weights.clone(),
        scheme,
    )
    .with_target(target);

    let eval = evaluator.evaluate(reference);
    let aggregates = evaluator.aggregates(reference);

    println!("\n🔎 === CURRENT BORDERS === 🔎");
    reports::print_subscores(eval.fitness, &eval.subscores);
    reports::print_region_table(bootstrap, &aggregates, &config.sides);
    reports::print_tally(&aggregates, &config.sides);
    Ok(())
}
