use borderforge::config::{Config, FitnessWeights};
use borderforge::dataset::loader::{load_bootstrap, AdjacencyFormat, FileSource};
use borderforge::dataset::synthetic::{GridSize, LeanModel, SyntheticGrid};
use borderforge::dataset::Bootstrap;
use borderforge::error::{BfResult, BorderForgeError};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, short, long, default_value = "data/units.csv")]
    units: PathBuf,

    #[arg(global = true, short, long, default_value = "data/county_adjacency.txt")]
    adjacency: PathBuf,

    #[arg(global = true, long, value_enum, default_value_t = AdjacencyFormat::Census)]
    format: AdjacencyFormat,

    /// `id,region` CSV with the current borders.
    #[arg(global = true, long)]
    reference: Option<PathBuf>,

    /// State codes dropped from census data.
    #[arg(global = true, long, value_delimiter = ',', default_value = "AK,HI")]
    exclude: Vec<String>,

    /// Generate a map instead of loading one, e.g. `grid:12x8`.
    #[arg(global = true, long)]
    synthetic: Option<GridSize>,

    #[arg(global = true, long, value_enum, default_value_t = LeanModel::StateBased)]
    lean_model: LeanModel,

    #[arg(global = true, long)]
    data_seed: Option<u64>,

    #[arg(global = true, short = 'r', long)]
    regions: Option<u32>,

    #[arg(global = true, long)]
    weights: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search(cmd::search::SearchArgs),
    Validate(cmd::validate::ValidateArgs),
}

fn main() {
    // 1. Parse raw matches so explicit flags can be told apart from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli, &matches) {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli, matches: &ArgMatches) -> BfResult<()> {
    println!("\n🗺️  Initializing BorderForge...");

    // 2. Config from the subcommand, plus the matches it was parsed from
    let (mut config, sub_matches) = match &cli.command {
        Commands::Search(args) => (args.config.clone(), matches.subcommand_matches("search")),
        Commands::Validate(args) => (args.config.clone(), matches.subcommand_matches("validate")),
    };

    // 3. Weights file as the base, explicit CLI flags on top
    if let Some(path) = &cli.weights {
        println!("⚖️  Loading Weights from: {}", path.display());
        let mut file_weights = FitnessWeights::load_from_file(path)?;
        if let Some(sub) = sub_matches {
            file_weights.merge_from_cli(&config.weights, sub);
        }
        config.weights = file_weights;
    }
    config.validate()?;

    // 4. Data
    let bootstrap = load_data(cli)?;
    println!(
        "📂 {} units, {} adjacencies, {} regions",
        bootstrap.unit_count(),
        bootstrap.graph.edge_count(),
        bootstrap.region_count
    );

    // 5. Execute
    match &cli.command {
        Commands::Search(args) => cmd::search::run(args, bootstrap, config),
        Commands::Validate(args) => cmd::validate::run(args, &bootstrap, &config),
    }
}

fn load_data(cli: &Cli) -> BfResult<Bootstrap> {
    if let Some(size) = cli.synthetic {
        let regions = cli.regions.ok_or_else(|| {
            BorderForgeError::Config("--regions is required with --synthetic".into())
        })?;
        println!(
            "🎲 Synthetic {}x{} grid ({} leans)",
            size.width, size.height, cli.lean_model
        );
        return SyntheticGrid::builder()
            .size(size)
            .region_count(regions)
            .lean_model(cli.lean_model)
            .seed(cli.data_seed)
            .build()
            .generate();
    }

    println!("📂 Loading Units: {}", cli.units.display());
    load_bootstrap(&FileSource {
        units: &cli.units,
        adjacency: &cli.adjacency,
        format: cli.format,
        reference: cli.reference.as_deref(),
        exclude: &cli.exclude,
        region_count: cli.regions,
    })
}
