use crate::{
    error::{ParamsError, check_probability},
    solver::{genetic::genetic_params::GeneticParams, sls::neighborhood::NeighborhoodFunction},
};

use super::{evolution_strategy::EvolutionStrategy, improvement_operator::ImproveStrategy};

#[derive(Clone, Debug)]
pub struct MemeticParams {
    pub genetic: GeneticParams,
    /// Chance that an offspring goes through an improvement operator.
    pub improve_probability: f64,
    pub improve_strategy: ImproveStrategy,
    pub evolution_strategy: EvolutionStrategy,
    /// Neighborhood of the SLS improvement operator.
    pub neighborhood: NeighborhoodFunction,
    /// Donors and recipients considered by the robin hood operators.
    pub robin_hood_stations: usize,
}

impl Default for MemeticParams {
    fn default() -> Self {
        Self {
            genetic: GeneticParams {
                seeding_size: 3,
                ..GeneticParams::default()
            },
            improve_probability: 0.1,
            improve_strategy: ImproveStrategy::OperatorCritic,
            evolution_strategy: EvolutionStrategy::Lamarckian,
            neighborhood: NeighborhoodFunction::default(),
            robin_hood_stations: 3,
        }
    }
}

impl MemeticParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.genetic.validate()?;
        check_probability("improve_probability", self.improve_probability)?;
        self.neighborhood.validate()?;

        if self.robin_hood_stations == 0 {
            return Err(ParamsError::OutOfRange {
                name: "robin_hood_stations",
                reason: String::from("at least one donor and one recipient are needed"),
            });
        }

        Ok(())
    }
}
