use std::{path::PathBuf, sync::Arc};

use ambulance_optimizer::{
    json::types::JsonServiceRegion,
    problem::dispatch_policy::DispatchPolicy,
    simulation::{config::SimulationConfig, simulator::Simulator},
};
use anyhow::Context;
use clap::Args;
use jiff::{SignedDuration, civil::DateTime};
use tracing::info;

use crate::parsers;

/// Input region and simulation window shared by every command.
#[derive(Args)]
pub struct RegionArgs {
    /// Service region JSON file
    #[arg(short, long, env = "AMBULANCE_INPUT")]
    input: PathBuf,

    /// First scored call (e.g., "2018-01-08" or "2018-01-08T08:00")
    #[arg(long, value_parser = parsers::parse_datetime, default_value = "2018-01-08")]
    start: DateTime,

    #[arg(long, value_parser = parsers::parse_datetime, default_value = "2018-01-15")]
    end: DateTime,

    /// Warm-up simulated before the start without being scored
    #[arg(long, value_parser = parsers::parse_duration, default_value = "4h")]
    buffer: SignedDuration,

    #[arg(long, default_value_t = 39)]
    day_ambulances: usize,

    #[arg(long, default_value_t = 22)]
    night_ambulances: usize,

    /// Dispatch ranking: fastest, euclidean or manhattan
    #[arg(long, default_value = "fastest")]
    policy: DispatchPolicy,
}

impl RegionArgs {
    pub fn config(&self) -> SimulationConfig {
        SimulationConfig {
            start: self.start,
            end: self.end,
            buffer: self.buffer,
            num_ambulances_day: self.day_ambulances,
            num_ambulances_night: self.night_ambulances,
            dispatch_policy: self.policy,
            ..SimulationConfig::default()
        }
    }

    pub fn load_simulator(&self) -> Result<Arc<Simulator>, anyhow::Error> {
        info!("Loading service region from {:?}", self.input);
        let region = JsonServiceRegion::from_file(&self.input)
            .and_then(JsonServiceRegion::build_region)
            .with_context(|| format!("Failed to load {:?}", self.input))?;

        Ok(Arc::new(Simulator::new(Arc::new(region))))
    }
}
