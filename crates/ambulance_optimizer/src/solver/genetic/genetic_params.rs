use crate::{
    error::{ParamsError, check_probability},
    solver::{
        initializer::Initializer,
        params::{DEFAULT_SEED, Termination, Threads, default_terminations, validate_terminations},
    },
};

#[derive(Clone, Debug)]
pub struct GeneticParams {
    /// `Iterations` counts generations.
    pub terminations: Vec<Termination>,
    pub population_size: usize,
    pub elite_size: usize,
    pub tournament_size: usize,
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    pub use_swap_mutation: bool,
    /// Individuals of the first generation from the population proportionate initializer.
    pub seeding_size: usize,
    pub initializer: Initializer,
    pub threads: Threads,
    pub seed: u64,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            terminations: default_terminations(999),
            population_size: 30,
            elite_size: 4,
            tournament_size: 5,
            crossover_probability: 0.15,
            mutation_probability: 0.05,
            use_swap_mutation: true,
            seeding_size: 0,
            initializer: Initializer::Random,
            threads: Threads::Auto,
            seed: DEFAULT_SEED,
        }
    }
}

impl GeneticParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_terminations(&self.terminations)?;
        check_probability("crossover_probability", self.crossover_probability)?;
        check_probability("mutation_probability", self.mutation_probability)?;

        if self.population_size < 2 {
            return Err(ParamsError::OutOfRange {
                name: "population_size",
                reason: format!("{} is below 2", self.population_size),
            });
        }

        if self.elite_size >= self.population_size {
            return Err(ParamsError::OutOfRange {
                name: "elite_size",
                reason: format!(
                    "{} leaves no room for offspring in a population of {}",
                    self.elite_size, self.population_size
                ),
            });
        }

        if self.tournament_size < 2 || self.tournament_size > self.population_size {
            return Err(ParamsError::OutOfRange {
                name: "tournament_size",
                reason: format!(
                    "{} is not within [2, {}]",
                    self.tournament_size, self.population_size
                ),
            });
        }

        if self.seeding_size > self.population_size {
            return Err(ParamsError::OutOfRange {
                name: "seeding_size",
                reason: format!(
                    "{} exceeds the population size {}",
                    self.seeding_size, self.population_size
                ),
            });
        }

        Ok(())
    }
}
