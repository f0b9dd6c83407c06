use jiff::Timestamp;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{info, instrument};

use crate::{
    error::{OptimizerError, ParamsError},
    solver::{
        evaluator::Evaluator,
        optimizer::{Optimizer, Progress, ProgressHandler},
        params::should_terminate,
        solution::Solution,
        statistics::{GenerationRow, RunStatistics},
    },
    timer_debug,
};

use super::{
    genetic_operators::{crossover, mutate},
    genetic_params::GeneticParams,
    next_generation::NextGeneration,
    population::Population,
};

/// Generational loop shared by the genetic and memetic algorithms.
pub(crate) struct Evolution<'a> {
    pub evaluator: &'a Evaluator,
    pub params: &'a GeneticParams,
    pub abbreviation: &'a str,
    pub rng: &'a mut SmallRng,
    pub statistics: &'a mut Vec<GenerationRow>,
    pub progress_handler: Option<&'a mut ProgressHandler>,
}

impl Evolution<'_> {
    /// Evolves until a termination is met, `improve` runs on every offspring after mutation.
    pub fn run<F>(mut self, improve: F) -> Result<Population, OptimizerError>
    where
        F: Fn(&mut Solution, &mut SmallRng) -> Result<(), OptimizerError> + Sync,
    {
        let start = Timestamp::now();
        info!("Starting {} optimizer", self.abbreviation);
        self.statistics.clear();

        let mut population = Population::initialize(
            self.params.population_size,
            self.params.seeding_size,
            self.params.initializer,
            self.evaluator,
            self.rng,
        );
        population.evaluate(self.evaluator)?;

        let mut generation = 0;
        loop {
            self.record(generation, &population);
            if should_terminate(&self.params.terminations, start, generation) {
                break;
            }

            population = timer_debug!("Generation", self.next_generation(&population, &improve)?);
            generation += 1;
        }

        info!(
            best = population.best_fitness(),
            elapsed = ?Timestamp::now().duration_since(start),
            "{} finished",
            self.abbreviation
        );

        Ok(population)
    }

    #[instrument(skip_all, level = "debug")]
    fn next_generation<F>(
        &mut self,
        population: &Population,
        improve: &F,
    ) -> Result<Population, OptimizerError>
    where
        F: Fn(&mut Solution, &mut SmallRng) -> Result<(), OptimizerError> + Sync,
    {
        let params = self.params;
        let num_base_stations = self.evaluator.region().num_base_stations();

        let next = NextGeneration::new(
            params.population_size,
            population.elite(params.elite_size),
        );

        // Every task gets its own rng derived from the master one
        let pairs = (params.population_size - params.elite_size).div_ceil(2);
        let seeds = (0..pairs)
            .map(|_| self.rng.random::<u64>())
            .collect::<Vec<_>>();

        seeds
            .into_par_iter()
            .try_for_each(|seed| -> Result<(), OptimizerError> {
                let mut rng = SmallRng::seed_from_u64(seed);
                let Some((parent_a, parent_b)) =
                    population.tournament(params.tournament_size, &mut rng)
                else {
                    return Ok(());
                };

                let (mut offspring_a, mut offspring_b) = crossover(
                    &parent_a,
                    &parent_b,
                    params.crossover_probability,
                    &mut rng,
                );

                for offspring in [&mut offspring_a, &mut offspring_b] {
                    mutate(
                        offspring,
                        params.mutation_probability,
                        params.use_swap_mutation,
                        num_base_stations,
                        &mut rng,
                    );
                    improve(offspring, &mut rng)?;
                }

                next.insert_pair(offspring_a, offspring_b);
                Ok(())
            })?;

        let mut population = next.into_population();
        population.evaluate(self.evaluator)?;
        Ok(population)
    }

    fn record(&mut self, generation: usize, population: &Population) {
        let row = GenerationRow {
            timestamp: Timestamp::now(),
            generation,
            best: population.best_fitness(),
            average: population.average_fitness(),
            diversity: population.diversity(self.evaluator.region().num_base_stations()),
        };

        info!(
            generation,
            best = row.best,
            average = row.average,
            diversity = row.diversity,
            "{} generation",
            self.abbreviation
        );

        if let Some(handler) = self.progress_handler.as_mut() {
            handler(Progress {
                iteration: generation,
                best_fitness: row.best,
            });
        }

        self.statistics.push(row);
    }
}

pub struct GeneticAlgorithm {
    evaluator: Evaluator,
    params: GeneticParams,
    rng: SmallRng,
    population: Option<Population>,
    statistics: Vec<GenerationRow>,
    progress_handler: Option<ProgressHandler>,
}

impl GeneticAlgorithm {
    pub fn new(evaluator: Evaluator, params: GeneticParams) -> Result<Self, ParamsError> {
        params.validate()?;

        Ok(Self {
            evaluator,
            rng: SmallRng::seed_from_u64(params.seed),
            params,
            population: None,
            statistics: Vec::new(),
            progress_handler: None,
        })
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }
}

impl Optimizer for GeneticAlgorithm {
    fn optimize(&mut self) -> Result<(), OptimizerError> {
        let abbreviation = self.abbreviation();
        let pool = self.params.threads.build_pool()?;

        let population = pool.install(|| {
            Evolution {
                evaluator: &self.evaluator,
                params: &self.params,
                abbreviation: &abbreviation,
                rng: &mut self.rng,
                statistics: &mut self.statistics,
                progress_handler: self.progress_handler.as_mut(),
            }
            .run(|_, _| Ok(()))
        })?;

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
        String::from("GA")
    }

    fn on_progress(&mut self, handler: ProgressHandler) {
        self.progress_handler = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        solver::params::{Termination, Threads},
        test_utils,
    };

    use super::*;

    fn params() -> GeneticParams {
        GeneticParams {
            terminations: vec![Termination::Iterations(3)],
            population_size: 7,
            elite_size: 2,
            tournament_size: 3,
            crossover_probability: 0.5,
            mutation_probability: 0.2,
            threads: Threads::Single,
            ..GeneticParams::default()
        }
    }

    #[test]
    fn test_elitism_keeps_best_fitness() {
        let mut ga = GeneticAlgorithm::new(test_utils::create_test_evaluator(), params()).unwrap();
        ga.optimize().unwrap();

        let RunStatistics::Generations(rows) = ga.run_statistics() else {
            panic!("expected generation statistics");
        };
        assert_eq!(rows.len(), 4);
        assert!(rows.windows(2).all(|pair| pair[1].best <= pair[0].best));
        assert!(rows.iter().all(|row| (0.0..=1.0).contains(&row.diversity)));

        let best = ga.optimal_solution().unwrap();
        assert_eq!(best.cached_fitness(), rows.last().map(|row| row.best));
    }

    #[test]
    fn test_elite_survives_one_generation() {
        let evaluator = test_utils::create_test_evaluator();
        let params = GeneticParams {
            crossover_probability: 1.0,
            mutation_probability: 1.0,
            ..params()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let mut statistics = Vec::new();

        let mut population = Population::initialize(
            params.population_size,
            params.seeding_size,
            params.initializer,
            &evaluator,
            &mut rng,
        );
        population.evaluate(&evaluator).unwrap();
        let elite = population.elite(params.elite_size);

        let mut evolution = Evolution {
            evaluator: &evaluator,
            params: &params,
            abbreviation: "GA",
            rng: &mut rng,
            statistics: &mut statistics,
            progress_handler: None,
        };
        let next = evolution
            .next_generation(&population, &|_, _| Ok(()))
            .unwrap();

        assert_eq!(next.len(), params.population_size);
        let next_elite = next.elite(params.elite_size);
        for (kept, survivor) in elite.iter().zip(&next_elite) {
            assert!(survivor.cached_fitness().unwrap() <= kept.cached_fitness().unwrap());
        }
        for kept in &elite {
            assert!(next.individuals().iter().any(|individual| {
                individual.allocation() == kept.allocation()
                    && individual.cached_fitness() == kept.cached_fitness()
            }));
        }
    }

    #[test]
    fn test_odd_remainder_fills_population() {
        let mut ga = GeneticAlgorithm::new(test_utils::create_test_evaluator(), params()).unwrap();
        ga.optimize().unwrap();

        let population = ga.population().unwrap();
        assert_eq!(population.len(), 7);
        assert!(population.individuals().iter().all(Solution::is_evaluated));
    }

    #[test]
    fn test_progress_is_reported() {
        use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

        let reported = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reported);

        let mut ga = GeneticAlgorithm::new(test_utils::create_test_evaluator(), params()).unwrap();
        ga.on_progress(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));
        ga.optimize().unwrap();

        assert_eq!(reported.load(Ordering::Relaxed), 4);
    }
}
