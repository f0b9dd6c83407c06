use std::{fs::File, io::BufReader, path::PathBuf};

use ambulance_optimizer::{
    problem::allocation::Allocation,
    solver::{initializer::Initializer, params::DEFAULT_SEED},
};
use anyhow::Context;
use clap::Args;
use rand::{SeedableRng, rngs::SmallRng};
use tracing::info;

use crate::region_args::RegionArgs;

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    region: RegionArgs,

    /// Allocation JSON with `day` and `night` station indices
    #[arg(short, long)]
    allocation: Option<PathBuf>,

    /// Initializer used when no allocation is given
    #[arg(long, default_value = "population_proportionate")]
    initializer: Initializer,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

pub fn run(args: SimulateArgs) -> Result<(), anyhow::Error> {
    let simulator = args.region.load_simulator()?;
    let config = args.region.config();

    let allocation = match &args.allocation {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
            serde_json::from_reader::<_, Allocation>(BufReader::new(file))
                .with_context(|| format!("Failed to parse allocation {path:?}"))?
        }
        None => {
            let mut rng = SmallRng::seed_from_u64(args.seed);
            args.initializer
                .initialize(simulator.region(), &config, &mut rng)
        }
    };

    info!("Simulating allocation {allocation}");
    let response_times = simulator.simulate(&allocation, &config)?;

    let (Some(average), Some(median)) = (response_times.average(), response_times.median()) else {
        println!("No calls were scored between {} and {}", config.start, config.end);
        return Ok(());
    };

    println!("Scored calls: {}", response_times.len());
    println!("Average response time: {average:.1}s");
    println!("Median response time: {median:.1}s");

    Ok(())
}
