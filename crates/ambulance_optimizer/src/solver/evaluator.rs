use std::sync::Arc;

use crate::{
    error::{EvaluationError, ParamsError},
    problem::{allocation::Allocation, service_region::ServiceRegion},
    simulation::{config::SimulationConfig, simulator::Simulator},
};

/// Scores allocations by their mean simulated response time, in seconds.
#[derive(Clone)]
pub struct Evaluator {
    simulator: Arc<Simulator>,
    config: Arc<SimulationConfig>,
}

impl Evaluator {
    pub fn new(simulator: Arc<Simulator>, config: SimulationConfig) -> Result<Self, ParamsError> {
        config.validate()?;

        Ok(Self {
            simulator,
            config: Arc::new(config),
        })
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn region(&self) -> &ServiceRegion {
        self.simulator.region()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn evaluate(&self, allocation: &Allocation) -> Result<f64, EvaluationError> {
        let response_times = self
            .simulator
            .simulate(allocation, &self.config)
            .map_err(|source| EvaluationError::Simulation {
                allocation: allocation.clone(),
                config: Box::new(self.config.as_ref().clone()),
                source,
            })?;

        response_times
            .average()
            .ok_or(EvaluationError::NoScoredIncidents {
                start: self.config.start,
                end: self.config.end,
            })
    }
}
