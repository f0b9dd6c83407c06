use crate::{
    error::{ParamsError, check_probability},
    solver::{
        initializer::Initializer,
        params::{DEFAULT_SEED, Termination, Threads, default_terminations, validate_terminations},
    },
};

use super::neighborhood::NeighborhoodFunction;

#[derive(Clone, Debug)]
pub struct SlsParams {
    /// `Iterations` counts restarts.
    pub terminations: Vec<Termination>,
    pub restart_probability: f64,
    pub noise_probability: f64,
    pub neighborhood: NeighborhoodFunction,
    /// Name the run after its neighborhood instead of plain `SLS`, to tell variants apart.
    pub label_neighborhood: bool,
    pub initializer: Initializer,
    pub threads: Threads,
    pub seed: u64,
}

impl Default for SlsParams {
    fn default() -> Self {
        Self {
            terminations: default_terminations(999),
            restart_probability: 0.025,
            noise_probability: 0.65,
            neighborhood: NeighborhoodFunction::default(),
            label_neighborhood: false,
            initializer: Initializer::Random,
            threads: Threads::Auto,
            seed: DEFAULT_SEED,
        }
    }
}

impl SlsParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_terminations(&self.terminations)?;
        check_probability("restart_probability", self.restart_probability)?;
        check_probability("noise_probability", self.noise_probability)?;
        self.neighborhood.validate()
    }
}
