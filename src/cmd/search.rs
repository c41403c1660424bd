use crate::reports;
use borderforge::config::{BorderWalk, Config};
use borderforge::control::{self, Command, Event};
use borderforge::dataset::Bootstrap;
use borderforge::error::{BfResult, BorderForgeError};
use clap::Args;
use std::time::Instant;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short = 'g', long, default_value_t = 200)]
    pub generations: u64,

    #[arg(long, default_value_t = 10)]
    pub render_every: u64,

    /// Side to favour: a configured side name, `side1`, `side2` or `tie`.
    #[arg(short = 't', long)]
    pub target_side: Option<String>,

    #[arg(short = 'm', long, value_enum, default_value_t = BorderWalk::Standard)]
    pub mode: BorderWalk,

    /// Pause once this generation is reported, then resume.
    #[arg(long)]
    pub stop_after: Option<u64>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

pub fn run(args: &SearchArgs, bootstrap: Bootstrap, config: Config) -> BfResult<()> {
    let target_side = args
        .target_side
        .as_deref()
        .map(|label| {
            config.sides.resolve(label).ok_or_else(|| {
                BorderForgeError::Config(format!("unknown target side '{}'", label))
            })
        })
        .transpose()?;

    let sides = config.sides.clone();
    let capacity = config.search.summary_capacity;
    let controller = control::RunController::new(bootstrap, config, args.seed)?;
    let handle = control::spawn(controller, capacity)?;

    println!(
        "🧬 Evolving for {} generations ({} walk)",
        args.generations, args.mode
    );
    handle.send(Command::Start {
        generations: args.generations,
        render_every: args.render_every,
        resume: false,
        target_side,
        mode: Some(args.mode),
    })?;

    let start = Instant::now();
    let mut pause_pending = args.stop_after.filter(|&g| g < args.generations);
    let mut started = false;
    let mut failure = None;

    for event in handle.events().iter() {
        match event {
            Event::Started {
                generation,
                total,
                resumed,
            } => {
                started = true;
                let verb = if resumed { "Resumed" } else { "Started" };
                println!("▶️  {} at generation {} of {}", verb, generation, total);
            }
            Event::GenerationUpdate(summary) => {
                reports::print_progress(&summary, start.elapsed());
                if pause_pending.is_some_and(|g| summary.generation >= g) {
                    pause_pending = None;
                    handle.send(Command::Stop)?;
                }
            }
            Event::Stopping => println!("⏸️  Stopping..."),
            Event::Paused { generation, total } => {
                println!("⏸️  Paused at generation {} of {}", generation, total);
                handle.send(Command::Start {
                    generations: total,
                    render_every: args.render_every,
                    resume: true,
                    target_side,
                    mode: Some(args.mode),
                })?;
            }
            Event::Completed {
                generation,
                best_score,
            } => {
                println!(
                    "🏁 Completed {} generations in {:.2}s (best {:.4})",
                    generation,
                    start.elapsed().as_secs_f32(),
                    best_score
                );
                break;
            }
            Event::Error { kind, message } if !started => {
                failure = Some(kind.into_error(message));
                break;
            }
            // A late stop can race with completion; the run itself is fine.
            Event::Error { kind, message } => eprintln!("⚠️  {}: {}", kind, message),
            _ => {}
        }
    }

    let dropped = handle.dropped_updates();
    let controller = handle.shutdown();
    if let Some(e) = failure {
        return Err(e);
    }
    if dropped > 0 {
        println!("   ({} progress updates skipped)", dropped);
    }

    let Some(best) = controller.best() else {
        return Ok(());
    };
    let evaluator = controller.evaluator();
    let aggregates = evaluator.aggregates(&best.assignment);

    println!("\n=== 🏆 BEST PLAN (generation {}) ===", controller.best_generation());
    reports::print_subscores(best.fitness, &best.subscores);
    reports::print_region_table(controller.bootstrap(), &aggregates, &sides);
    reports::print_tally(&aggregates, &sides);
    Ok(())
}
