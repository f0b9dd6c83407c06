use std::{fs::File, io::BufWriter, path::PathBuf, time::Duration};

use ambulance_optimizer::{
    problem::allocation::Allocation,
    solver::{
        evaluator::Evaluator,
        genetic::{genetic_algorithm::GeneticAlgorithm, genetic_params::GeneticParams},
        initializer::Initializer,
        memetic::{
            evolution_strategy::EvolutionStrategy,
            improvement_operator::ImproveStrategy,
            memetic_algorithm::MemeticAlgorithm,
            memetic_params::MemeticParams,
        },
        optimizer::{Optimizer, Progress},
        params::{DEFAULT_SEED, Termination, Threads},
        sls::{
            neighborhood::{DEFAULT_LAZY_SIZE, NeighborhoodFunction},
            sls_params::SlsParams,
            stochastic_local_search::StochasticLocalSearch,
        },
        statistics::RunStatistics,
    },
};
use anyhow::Context;
use clap::{Args, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::{parsers, region_args::RegionArgs};

#[derive(Clone, Copy, ValueEnum)]
enum OptimizerKind {
    /// Stochastic local search
    Sls,
    /// Genetic algorithm
    Ga,
    /// Memetic algorithm
    Ma,
}

#[derive(Args)]
pub struct OptimizeArgs {
    #[command(flatten)]
    region: RegionArgs,

    #[arg(long, value_enum, default_value_t = OptimizerKind::Ma)]
    optimizer: OptimizerKind,

    /// Timeout for the optimizer (e.g., "30s", "5m", "PT1H30M")
    #[arg(short, long, value_parser = parsers::parse_duration, default_value = "240m")]
    duration: jiff::SignedDuration,

    /// Maximum tries for SLS, generations for GA and MA
    #[arg(long, default_value_t = 999)]
    iterations: usize,

    /// Worker threads, all available cores when absent
    #[arg(short, long)]
    threads: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    #[arg(long, default_value = "random")]
    initializer: Initializer,

    /// forward, hamming or lazy
    #[arg(long, default_value = "lazy")]
    neighborhood: String,

    #[arg(long, default_value_t = DEFAULT_LAZY_SIZE)]
    lazy_size: usize,

    /// Names SLS runs after their neighborhood (FSLS, HSLS, LazySLS_<n>)
    #[arg(long)]
    label_neighborhood: bool,

    #[arg(long, default_value = "operator_critic")]
    improve_strategy: ImproveStrategy,

    #[arg(long, default_value = "lamarckian")]
    evolution_strategy: EvolutionStrategy,

    /// Writes the best allocation and the run statistics as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct OptimizationReport {
    optimizer: String,
    fitness: Option<f64>,
    allocation: Option<Allocation>,
    statistics: RunStatistics,
}

impl OptimizeArgs {
    fn terminations(&self) -> Vec<Termination> {
        vec![
            Termination::Iterations(self.iterations),
            Termination::Duration(self.duration),
        ]
    }

    fn threads(&self) -> Threads {
        match self.threads {
            Some(1) => Threads::Single,
            Some(threads) => Threads::Multi(threads),
            None => Threads::Auto,
        }
    }

    fn genetic_params(&self) -> GeneticParams {
        GeneticParams {
            terminations: self.terminations(),
            initializer: self.initializer,
            threads: self.threads(),
            seed: self.seed,
            ..GeneticParams::default()
        }
    }

    fn build_optimizer(&self, evaluator: Evaluator) -> Result<Box<dyn Optimizer>, anyhow::Error> {
        let neighborhood = NeighborhoodFunction::parse_with_size(&self.neighborhood, self.lazy_size)?;

        let optimizer: Box<dyn Optimizer> = match self.optimizer {
            OptimizerKind::Sls => Box::new(StochasticLocalSearch::new(
                evaluator,
                SlsParams {
                    terminations: self.terminations(),
                    neighborhood,
                    label_neighborhood: self.label_neighborhood,
                    initializer: self.initializer,
                    threads: self.threads(),
                    seed: self.seed,
                    ..SlsParams::default()
                },
            )?),
            OptimizerKind::Ga => Box::new(GeneticAlgorithm::new(evaluator, self.genetic_params())?),
            OptimizerKind::Ma => {
                let defaults = MemeticParams::default();
                Box::new(MemeticAlgorithm::new(
                    evaluator,
                    MemeticParams {
                        genetic: GeneticParams {
                            seeding_size: defaults.genetic.seeding_size,
                            ..self.genetic_params()
                        },
                        improve_strategy: self.improve_strategy,
                        evolution_strategy: self.evolution_strategy,
                        neighborhood,
                        ..defaults
                    },
                )?)
            }
        };

        Ok(optimizer)
    }
}

pub fn run(args: OptimizeArgs) -> Result<(), anyhow::Error> {
    let simulator = args.region.load_simulator()?;
    let evaluator = Evaluator::new(simulator, args.region.config())?;
    let mut optimizer = args.build_optimizer(evaluator)?;
    let abbreviation = optimizer.abbreviation();

    let bar = ProgressBar::new_spinner();
    bar.enable_steady_tick(Duration::from_millis(250));
    bar.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed}] {msg}")?);
    bar.set_message(format!("{abbreviation} starting"));

    let progress_bar = bar.clone();
    let label = abbreviation.clone();
    optimizer.on_progress(Box::new(move |progress: Progress| {
        progress_bar.set_message(format!(
            "{label} iteration {} best {:.1}s",
            progress.iteration, progress.best_fitness
        ));
    }));

    let result = optimizer.optimize();
    bar.finish_and_clear();
    result?;

    let best = optimizer.optimal_solution();
    let fitness = best.and_then(|solution| solution.cached_fitness());
    let allocation = best.map(|solution| solution.allocation().to_sorted());

    match (&allocation, fitness) {
        (Some(allocation), Some(fitness)) => {
            info!(fitness, "{abbreviation} best allocation {allocation}");
        }
        _ => info!("{abbreviation} found no solution"),
    }

    let statistics = optimizer.run_statistics();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(statistics.headers().to_vec());
    for row in statistics.formatted_rows() {
        table.add_row(row);
    }
    println!("{table}");

    if let Some(path) = &args.output {
        let report = OptimizationReport {
            optimizer: abbreviation,
            fitness,
            allocation,
            statistics,
        };
        let file = File::create(path).with_context(|| format!("Failed to create {path:?}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
        info!("Report written to {path:?}");
    }

    Ok(())
}
