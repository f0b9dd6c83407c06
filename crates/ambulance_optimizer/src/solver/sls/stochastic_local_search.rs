use jiff::Timestamp;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, info};

use crate::{
    error::{OptimizerError, ParamsError},
    solver::{
        evaluator::Evaluator,
        optimizer::{Optimizer, Progress, ProgressHandler},
        params::should_terminate,
        solution::Solution,
        statistics::{RunStatistics, SlsRow},
    },
    timer_debug,
};

use super::{
    neighborhood::{NeighborhoodFunction, greedy_step, random_neighbor},
    sls_params::SlsParams,
};

/// Noisy greedy local search with random restarts over single position changes.
pub struct StochasticLocalSearch {
    evaluator: Evaluator,
    params: SlsParams,
    rng: SmallRng,
    best_solution: Option<Solution>,
    statistics: Vec<SlsRow>,
    progress_handler: Option<ProgressHandler>,
}

impl StochasticLocalSearch {
    pub fn new(evaluator: Evaluator, params: SlsParams) -> Result<Self, ParamsError> {
        params.validate()?;

        Ok(Self {
            evaluator,
            rng: SmallRng::seed_from_u64(params.seed),
            params,
            best_solution: None,
            statistics: Vec::new(),
            progress_handler: None,
        })
    }

    fn initial_solution(&mut self) -> Solution {
        Solution::new(self.params.initializer.initialize(
            self.evaluator.region(),
            self.evaluator.config(),
            &mut self.rng,
        ))
    }

    fn search(&mut self) -> Result<(), OptimizerError> {
        let abbreviation = self.abbreviation();
        let evaluator = self.evaluator.clone();
        let num_base_stations = evaluator.region().num_base_stations();
        let start = Timestamp::now();

        info!("Starting {} optimizer", abbreviation);
        self.statistics.clear();

        let mut solution = self.initial_solution();
        let mut best = solution.clone();
        let mut best_fitness = best.fitness(&evaluator)?;

        let mut tries = 0;
        let mut flips = 0;

        while !should_terminate(&self.params.terminations, start, tries) {
            if self.rng.random_bool(self.params.restart_probability) {
                solution = self.initial_solution();
                tries += 1;
                flips = 0;
                info!(tries, best = best_fitness, "{} restart", abbreviation);
            } else if self.rng.random_bool(self.params.noise_probability) {
                debug!(flips, "{} noise step", abbreviation);
                if let Some(neighbor) = random_neighbor(&solution, num_base_stations, &mut self.rng)? {
                    solution = neighbor;
                }
            } else {
                debug!(flips, "{} greedy step", abbreviation);
                timer_debug!(
                    "Greedy step",
                    greedy_step(
                        &mut solution,
                        self.params.neighborhood,
                        &evaluator,
                        &mut self.rng
                    )?
                );
            }

            let current = solution.fitness(&evaluator)?;
            if current <= best_fitness {
                best = solution.clone();
                best_fitness = current;
            }

            self.statistics.push(SlsRow {
                timestamp: Timestamp::now(),
                tries,
                flips,
                current,
                best: best_fitness,
            });
            flips += 1;

            if let Some(handler) = self.progress_handler.as_mut() {
                handler(Progress {
                    iteration: self.statistics.len(),
                    best_fitness,
                });
            }
        }

        info!(
            best = best_fitness,
            elapsed = ?Timestamp::now().duration_since(start),
            "{} finished",
            abbreviation
        );
        self.best_solution = Some(best);

        Ok(())
    }
}

impl Optimizer for StochasticLocalSearch {
    fn optimize(&mut self) -> Result<(), OptimizerError> {
        let pool = self.params.threads.build_pool()?;
        pool.install(|| self.search())
    }

    fn optimal_solution(&self) -> Option<&Solution> {
        self.best_solution.as_ref()
    }

    fn run_statistics(&self) -> RunStatistics {
        RunStatistics::Sls(self.statistics.clone())
    }

    fn abbreviation(&self) -> String {
        if !self.params.label_neighborhood {
            return String::from("SLS");
        }

        match self.params.neighborhood {
            NeighborhoodFunction::Forward => String::from("FSLS"),
            NeighborhoodFunction::Hamming => String::from("HSLS"),
            NeighborhoodFunction::Lazy { size } => format!("LazySLS_{size}"),
        }
    }

    fn on_progress(&mut self, handler: ProgressHandler) {
        self.progress_handler = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        solver::{
            params::{Termination, Threads},
            statistics::RunStatistics,
        },
        test_utils,
    };

    use super::*;

    fn params() -> SlsParams {
        SlsParams {
            terminations: vec![Termination::Iterations(2)],
            restart_probability: 0.2,
            neighborhood: NeighborhoodFunction::Lazy { size: 4 },
            threads: Threads::Single,
            ..SlsParams::default()
        }
    }

    #[test]
    fn test_best_never_worsens() {
        let mut sls = StochasticLocalSearch::new(test_utils::create_test_evaluator(), params()).unwrap();
        sls.optimize().unwrap();

        let RunStatistics::Sls(rows) = sls.run_statistics() else {
            panic!("expected SLS statistics");
        };
        assert!(!rows.is_empty());
        assert!(rows.windows(2).all(|pair| pair[1].best <= pair[0].best));
        assert!(rows.iter().all(|row| row.best <= row.current));
        assert_eq!(rows.last().map(|row| row.tries), Some(2));

        let best = sls.optimal_solution().unwrap();
        assert_eq!(best.cached_fitness(), rows.last().map(|row| row.best));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sls =
                StochasticLocalSearch::new(test_utils::create_test_evaluator(), params()).unwrap();
            sls.optimize().unwrap();
            sls.optimal_solution().unwrap().allocation().to_sorted()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_abbreviation() {
        let sls = StochasticLocalSearch::new(test_utils::create_test_evaluator(), params()).unwrap();
        assert_eq!(sls.abbreviation(), "SLS");

        let labeled = |neighborhood| {
            let params = SlsParams {
                neighborhood,
                label_neighborhood: true,
                ..params()
            };
            StochasticLocalSearch::new(test_utils::create_test_evaluator(), params)
                .unwrap()
                .abbreviation()
        };
        assert_eq!(labeled(NeighborhoodFunction::Lazy { size: 4 }), "LazySLS_4");
        assert_eq!(labeled(NeighborhoodFunction::Forward), "FSLS");
        assert_eq!(labeled(NeighborhoodFunction::Hamming), "HSLS");
    }
}
