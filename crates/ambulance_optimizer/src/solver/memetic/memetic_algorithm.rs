use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::debug;

use crate::{
    error::{OptimizerError, ParamsError},
    solver::{
        evaluator::Evaluator,
        genetic::{genetic_algorithm::Evolution, population::Population},
        optimizer::{Optimizer, ProgressHandler},
        sls::neighborhood::NeighborhoodFunction,
        solution::Solution,
        statistics::{GenerationRow, RunStatistics},
    },
};

use super::{
    improvement_operator::{ImproveStrategy, ImprovementOperator, robin_hood_operators},
    memetic_params::MemeticParams,
    operator_critic::OperatorCritic,
};

/// Genetic algorithm whose offspring are refined by local search.
pub struct MemeticAlgorithm {
    evaluator: Evaluator,
    params: MemeticParams,
    rng: SmallRng,
    population: Option<Population>,
    critic: Option<OperatorCritic<ImprovementOperator>>,
    statistics: Vec<GenerationRow>,
    progress_handler: Option<ProgressHandler>,
}

impl MemeticAlgorithm {
    pub fn new(evaluator: Evaluator, params: MemeticParams) -> Result<Self, ParamsError> {
        params.validate()?;

        Ok(Self {
            evaluator,
            rng: SmallRng::seed_from_u64(params.genetic.seed),
            params,
            population: None,
            critic: None,
            statistics: Vec::new(),
            progress_handler: None,
        })
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// Operator statistics of the last run.
    pub fn operator_critic(&self) -> Option<&OperatorCritic<ImprovementOperator>> {
        self.critic.as_ref()
    }

    fn build_critic(&mut self) -> OperatorCritic<ImprovementOperator> {
        let robin_hood = robin_hood_operators(self.params.robin_hood_stations);
        let sls = ImprovementOperator::Sls(self.params.neighborhood);

        match self.params.improve_strategy {
            ImproveStrategy::RobinHood => OperatorCritic::uniform(robin_hood),
            ImproveStrategy::Sls => OperatorCritic::uniform(vec![sls]),
            ImproveStrategy::OperatorCritic => {
                let mut operators = robin_hood;
                operators.push(sls);
                OperatorCritic::new(operators, &mut self.rng)
            }
        }
    }
}

impl Optimizer for MemeticAlgorithm {
    fn optimize(&mut self) -> Result<(), OptimizerError> {
        let abbreviation = self.abbreviation();
        let pool = self.params.genetic.threads.build_pool()?;
        let critic = Mutex::new(self.build_critic());

        let evaluator = &self.evaluator;
        let params = &self.params;
        let improve = |offspring: &mut Solution, rng: &mut SmallRng| -> Result<(), OptimizerError> {
            if params.evolution_strategy.is_darwinian()
                || !rng.random_bool(params.improve_probability)
            {
                return Ok(());
            }

            let parent_fitness = offspring.fitness(evaluator)?;
            let (index, operator) = {
                let critic = critic.lock();
                let Some(index) = critic.select_next(rng) else {
                    return Ok(());
                };
                (index, critic.operator(index))
            };

            let Some(neighbor) = operator.improve(offspring, evaluator, rng)? else {
                return Ok(());
            };

            if let Some(fitness) = neighbor.cached_fitness() {
                critic.lock().assign_credit(index, parent_fitness - fitness);
            }
            params
                .evolution_strategy
                .adopt(offspring, parent_fitness, neighbor);

            Ok(())
        };

        let population = pool.install(|| {
            Evolution {
                evaluator,
                params: &params.genetic,
                abbreviation: &abbreviation,
                rng: &mut self.rng,
                statistics: &mut self.statistics,
                progress_handler: self.progress_handler.as_mut(),
            }
            .run(improve)
        })?;

        let critic = critic.into_inner();
        debug!("Operator critic of {abbreviation}:{critic}");

        self.critic = Some(critic);
        self.population = Some(population);
        Ok(())
    }

    fn optimal_solution(&self) -> Option<&Solution> {
        self.population.as_ref().and_then(Population::best)
    }

    fn run_statistics(&self) -> RunStatistics {
        RunStatistics::Generations(self.statistics.clone())
    }

    fn abbreviation(&self) -> String {
        match self.params.improve_strategy {
            ImproveStrategy::RobinHood => String::from("FRB"),
            ImproveStrategy::OperatorCritic => String::from("OCMA"),
            ImproveStrategy::Sls => match self.params.neighborhood {
                NeighborhoodFunction::Forward => String::from("FMA"),
                NeighborhoodFunction::Hamming => String::from("HMA"),
                NeighborhoodFunction::Lazy { size } => format!("MA_LazySLS_{size}"),
            },
        }
    }

    fn on_progress(&mut self, handler: ProgressHandler) {
        self.progress_handler = Some(handler);
    }
}
