use borderforge::config::Config;
use borderforge::dataset::synthetic::{GridSize, SyntheticGrid};
use borderforge::fitness::outcome::WeightScheme;
use borderforge::fitness::FitnessEvaluator;
use borderforge::optimizer::initialization::grow_random_assignment;
use borderforge::optimizer::{EvolutionOptions, Population};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    let bootstrap = SyntheticGrid::builder()
        .size(GridSize {
            width: 40,
            height: 30,
        })
        .region_count(12)
        .seed(Some(7))
        .build()
        .generate()
        .expect("Failed to generate grid");
    let config = Config::default();
    let scheme = WeightScheme::from_config(&config.weights, None, bootstrap.region_count)
        .expect("Failed to build weight scheme");
    let evaluator = FitnessEvaluator::new(
        bootstrap.graph.clone(),
        bootstrap.attrs.clone(),
        config.weights.clone(),
        scheme,
    );

    let mut rng = fastrand::Rng::with_seed(1);
    let plan = grow_random_assignment(&bootstrap.graph, bootstrap.region_count, &mut rng);
    c.bench_function("evaluate (1200 units, 12 regions)", |b| {
        b.iter(|| evaluator.evaluate(black_box(&plan)))
    });

    let opts = EvolutionOptions::from(&config.search);
    c.bench_function("advance one generation (pop 60)", |b| {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut population = Population::seeded(
            &evaluator,
            bootstrap.reference.as_ref(),
            bootstrap.region_count,
            &opts,
            &mut rng,
        );
        b.iter(|| population.advance(&evaluator, &opts, &mut rng))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
